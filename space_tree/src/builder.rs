//! Recursive top-down construction of a tree.
//!
//! The builder owns a private copy of the dataset and reorders its columns while splitting, so
//! that every node ends up owning a contiguous column range. Nodes are pushed into the arena in
//! pre-order, which makes the root `NodeId(0)` and puts every child after its parent.

use log::debug;

use crate::bound::Bound;
use crate::dataset::Dataset;
use crate::error::Error;
use crate::metric::Metric;
use crate::node::{Node, NodeId};
use crate::split::Splitter;
use crate::statistic::Statistic;
use crate::tree::{Permutation, Tree};

pub struct NodeBuilder<'s, B, S, Sp> {
    dataset: Dataset,
    nodes: Vec<Node<B, S>>,
    splitter: &'s mut Sp,
    max_leaf_size: usize,
    old_from_new: Option<Vec<usize>>,
}

impl<'s, B, S, Sp> NodeBuilder<'s, B, S, Sp>
where
    B: Bound,
    S: Statistic,
    Sp: Splitter<B>,
{

    /// Copies `data`; the copy's columns are renumbered from zero.
    pub fn new(data: &Dataset, splitter: &'s mut Sp, max_leaf_size: usize) -> Result<Self, Error> {

        if max_leaf_size == 0 {
            return Err(Error::InvalidArgument("max_leaf_size must be at least 1".to_string()));
        }

        Ok(Self {
            dataset: data.rebased(),
            nodes: Vec::new(),
            splitter,
            max_leaf_size,
            old_from_new: None,
        })
    }

    /// Record where every column came from while splitting.
    pub fn track_permutation(mut self) -> Self {
        self.old_from_new = Some((0..self.dataset.n_cols()).collect());
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Builds the whole tree over every column and returns it with the permutation, if tracked.
    pub fn build(mut self) -> (Tree<B, S>, Option<Permutation>) {

        let count = self.dataset.n_cols();
        self.build_child(None, 0, count);

        let permutation = self.old_from_new.map(Permutation::from_old_from_new);
        let tree = Tree::from_parts(self.dataset, self.nodes);

        (tree, permutation)
    }

    /// Builds the subtree over columns `[begin, begin + count)` of the (already partly
    /// reordered) dataset below `parent`, and returns the id of its top node.
    pub fn build_child(&mut self, parent: Option<NodeId>, begin: usize, count: usize) -> NodeId {

        debug_assert!(begin + count <= self.dataset.n_cols());
        if let Some(map) = &self.old_from_new {
            debug_assert_eq!(map.len(), self.dataset.n_cols());
        }

        let id = NodeId(self.nodes.len());

        let mut bound = B::empty(self.dataset.dim());
        bound.union_columns(&self.dataset, begin, count);
        let furthest_descendant_distance = 0.5 * bound.diameter();

        self.nodes.push(Node {
            begin,
            count,
            bound,
            stat: S::default(),
            parent_distance: 0.0,
            furthest_descendant_distance,
            parent,
            left: None,
            right: None,
        });

        if count <= self.max_leaf_size {
            return id;
        }

        let split = self.splitter.split_node(
            &self.nodes[id.0].bound,
            &mut self.dataset,
            begin,
            count,
            self.old_from_new.as_deref_mut(),
        );

        let split_col = match split {
            Some(x) => x,
            None => {
                debug!("could not split {} points at [{}, {}), keeping an oversized leaf", count, begin, begin + count);
                return id;
            }
        };

        let left = self.build_child(Some(id), begin, split_col - begin);
        let right = self.build_child(Some(id), split_col, begin + count - split_col);

        self.nodes[id.0].left = Some(left);
        self.nodes[id.0].right = Some(right);

        let centroid = self.nodes[id.0].bound.centroid();
        for child in [left, right] {
            let child_centroid = self.nodes[child.0].bound.centroid();
            let distance = self.nodes[id.0].bound.metric().evaluate(&centroid, &child_centroid);
            self.nodes[child.0].parent_distance = distance;
        }

        id
    }
}
