//! Implementation of space partitioning tree creation and lookup
//!
//! A [`Tree`] owns its (reordered) dataset and an arena of nodes. Building copies the input
//! dataset, so the caller's copy keeps its original column order; the [`Permutation`] returned by
//! the `*_with_permutation` constructors translates between the two orders.

use crate::bound::{BallBound, Bound, HRectBound};
use crate::builder::NodeBuilder;
use crate::dataset::Dataset;
use crate::error::Error;
use crate::node::{Node, NodeId, NodeRef};
use crate::split::{MidpointSplit, Splitter};
use crate::statistic::{EmptyStatistic, Statistic};

pub type KdTree<S = EmptyStatistic> = Tree<HRectBound, S>;
pub type BallTree<S = EmptyStatistic> = Tree<BallBound, S>;

/// Cloning a tree deep-copies the arena and the dataset; the nodes of the clone refer to the
/// clone's dataset.
#[derive(Debug, Clone)]
pub struct Tree<B, S = EmptyStatistic> {
    dataset: Dataset,
    pub(crate) nodes: Vec<Node<B, S>>,
}

/// Column order before and after building.
///
/// `old_from_new[i]` is the original index of the column now stored at `i`; `new_from_old` is
/// its inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct Permutation {
    pub old_from_new: Vec<usize>,
    pub new_from_old: Vec<usize>,
}

impl Permutation {

    pub fn from_old_from_new(old_from_new: Vec<usize>) -> Self {

        let mut new_from_old = vec![0; old_from_new.len()];
        for (new, old) in old_from_new.iter().enumerate() {
            new_from_old[*old] = new;
        }

        Self {
            old_from_new,
            new_from_old,
        }
    }

    pub fn len(&self) -> usize {
        self.old_from_new.len()
    }

    pub fn is_empty(&self) -> bool {
        self.old_from_new.is_empty()
    }
}

impl<B: Bound, S: Statistic> Tree<B, S> {

    /// Builds a tree over a copy of `data` with the midpoint split.
    pub fn build(data: &Dataset, max_leaf_size: usize) -> Result<Self, Error> {

        Self::build_with_splitter(data, max_leaf_size, &mut MidpointSplit)
    }

    pub fn build_with_splitter<Sp: Splitter<B>>(data: &Dataset, max_leaf_size: usize, splitter: &mut Sp) -> Result<Self, Error> {

        let (tree, _) = NodeBuilder::new(data, splitter, max_leaf_size)?.build();
        Ok(tree)
    }

    /// Builds a tree and also reports how its columns map back to `data`.
    pub fn build_with_permutation(data: &Dataset, max_leaf_size: usize) -> Result<(Self, Permutation), Error> {

        Self::build_with_permutation_and_splitter(data, max_leaf_size, &mut MidpointSplit)
    }

    pub fn build_with_permutation_and_splitter<Sp: Splitter<B>>(
        data: &Dataset,
        max_leaf_size: usize,
        splitter: &mut Sp,
    ) -> Result<(Self, Permutation), Error> {

        let (tree, permutation) = NodeBuilder::new(data, splitter, max_leaf_size)?
            .track_permutation()
            .build();

        let permutation = match permutation {
            Some(x) => x,
            None => Permutation::from_old_from_new((0..tree.dataset.n_cols()).collect()),
        };

        Ok((tree, permutation))
    }

    /// Takes a finished arena (pre-order, root first) and builds every statistic bottom-up.
    pub(crate) fn from_parts(dataset: Dataset, nodes: Vec<Node<B, S>>) -> Self {

        let mut tree = Self::from_arena(dataset, nodes);

        //children always come after their parent, so reverse order is children-first
        for i in (0..tree.nodes.len()).rev() {
            let stat = S::from_node(NodeRef::new(&tree, NodeId(i)));
            tree.nodes[i].stat = stat;
        }

        tree
    }
}

impl<B, S> Tree<B, S> {

    /// Wraps an arena whose links and statistics are already in place.
    pub(crate) fn from_arena(dataset: Dataset, nodes: Vec<Node<B, S>>) -> Self {
        Self { dataset, nodes }
    }

    pub fn root(&self) -> NodeRef<'_, B, S> {
        NodeRef::new(self, NodeId(0))
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, B, S>> {
        match id.0 < self.nodes.len() {
            true => Some(NodeRef::new(self, id)),
            false => None,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Size of the arena. Same as `root().tree_size()` without walking the tree.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn find_by_begin_count(&self, begin: usize, count: usize) -> Option<NodeRef<'_, B, S>> {
        self.root().find_by_begin_count(begin, count)
    }

    /// All nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_, B, S>> + '_ {
        (0..self.nodes.len()).map(move |i| NodeRef::new(self, NodeId(i)))
    }

    pub fn leaves(&self) -> impl Iterator<Item = NodeRef<'_, B, S>> + '_ {
        self.iter().filter(|x| x.is_leaf())
    }
}
