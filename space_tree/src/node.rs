//! Holds the node record stored in a tree's arena and the borrowed view used to walk it.
//!
//! Nodes never own each other: children and parent are [`NodeId`]s into the arena of the tree
//! they belong to, and the dataset lives on the tree. A [`NodeRef`] pairs a tree with an id and
//! is what every query, traversal and rule works with.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::bound::Bound;
use crate::dataset::{Dataset, Point};
use crate::error::Error;
use crate::tree::Tree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "NODE {}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Node<B, S> {
    pub(crate) begin: usize,
    pub(crate) count: usize,
    pub(crate) bound: B,
    pub(crate) stat: S,
    pub(crate) parent_distance: f64,
    pub(crate) furthest_descendant_distance: f64,
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
}

/// Borrowed view of one node of a [`Tree`].
pub struct NodeRef<'a, B, S> {
    tree: &'a Tree<B, S>,
    id: NodeId,
}

impl<'a, B, S> Clone for NodeRef<'a, B, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, B, S> Copy for NodeRef<'a, B, S> {}

impl<'a, B, S> PartialEq for NodeRef<'a, B, S> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl<'a, B, S> fmt::Debug for NodeRef<'a, B, S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} [{}, {})", self.id, self.begin(), self.end())
    }
}

impl<'a, B, S> NodeRef<'a, B, S> {

    pub(crate) fn new(tree: &'a Tree<B, S>, id: NodeId) -> Self {
        Self { tree, id }
    }

    fn node(&self) -> &'a Node<B, S> {
        &self.tree.nodes[self.id.0]
    }

    fn at(&self, id: NodeId) -> Self {
        Self::new(self.tree, id)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a Tree<B, S> {
        self.tree
    }

    /// Absolute index of the first column owned by this node.
    pub fn begin(&self) -> usize {
        self.node().begin
    }

    pub fn count(&self) -> usize {
        self.node().count
    }

    /// One past the last column owned by this node.
    pub fn end(&self) -> usize {
        self.begin() + self.count()
    }

    pub fn bound(&self) -> &'a B {
        &self.node().bound
    }

    pub fn stat(&self) -> &'a S {
        &self.node().stat
    }

    /// Distance between this node's centroid and its parent's; 0 for the root.
    pub fn parent_distance(&self) -> f64 {
        self.node().parent_distance
    }

    /// Upper bound on the distance from the centroid to any descendant point.
    pub fn furthest_descendant_distance(&self) -> f64 {
        self.node().furthest_descendant_distance
    }

    /// The dataset of the tree this node belongs to.
    pub fn dataset(&self) -> &'a Dataset {
        self.tree.dataset()
    }

    pub fn parent(&self) -> Option<Self> {
        self.node().parent.map(|id| self.at(id))
    }

    pub fn left(&self) -> Option<Self> {
        self.node().left.map(|id| self.at(id))
    }

    pub fn right(&self) -> Option<Self> {
        self.node().right.map(|id| self.at(id))
    }

    /// `0` is the left child, anything else the right child.
    pub fn child(&self, index: usize) -> Option<Self> {
        match index {
            0 => self.left(),
            _ => self.right(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.node().left.is_none()
    }

    pub fn num_children(&self) -> usize {
        match (self.node().left, self.node().right) {
            (Some(_), Some(_)) => 2,
            (Some(_), None) | (None, Some(_)) => 1,
            (None, None) => 0,
        }
    }

    /// Whether this node is the right child of its parent.
    pub fn is_right_child(&self) -> bool {
        match self.parent() {
            None => false,
            Some(parent) => parent.node().right == Some(self.id),
        }
    }

    /// Points held directly by this node: all of them for a leaf, none for an internal node.
    pub fn num_points(&self) -> usize {
        match self.is_leaf() {
            true => self.count(),
            false => 0,
        }
    }

    /// Absolute column index of the `index`-th point held by this node.
    pub fn point(&self, index: usize) -> usize {
        self.begin() + index
    }

    pub fn points(&self) -> impl Iterator<Item = Point<'a>> + 'a {
        let dataset = self.dataset();
        let begin = self.begin();
        (begin..begin + self.num_points()).map(move |i| dataset.point(i))
    }

    pub fn num_descendants(&self) -> usize {
        self.count()
    }

    pub fn descendant(&self, index: usize) -> usize {
        self.begin() + index
    }

    /// Number of nodes strictly below this one. Walks the whole subtree.
    pub fn num_descendant_nodes(&self) -> usize {

        let left = self.left().map(|x| 1 + x.num_descendant_nodes()).unwrap_or(0);
        let right = self.right().map(|x| 1 + x.num_descendant_nodes()).unwrap_or(0);

        left + right
    }

    /// The `index`-th strict descendant in breadth-first order.
    pub fn descendant_node(&self, index: usize) -> Result<Self, Error> {

        let mut queue: VecDeque<Self> = VecDeque::new();
        queue.extend(self.left());
        queue.extend(self.right());

        let mut current = 0;
        while let Some(node) = queue.pop_front() {
            if current == index {
                return Ok(node);
            }

            queue.extend(node.left());
            queue.extend(node.right());
            current += 1;
        }

        Err(Error::InvalidArgument(format!(
            "descendant node {} requested but {} has only {}",
            index, self.id, current
        )))
    }

    /// Number of nodes in this subtree, this one included. Not cached.
    pub fn tree_size(&self) -> usize {
        1 + self.left().map(|x| x.tree_size()).unwrap_or(0)
            + self.right().map(|x| x.tree_size()).unwrap_or(0)
    }

    /// Number of levels in this subtree, this one included. Not cached.
    pub fn tree_depth(&self) -> usize {
        1 + std::cmp::max(
            self.left().map(|x| x.tree_depth()).unwrap_or(0),
            self.right().map(|x| x.tree_depth()).unwrap_or(0),
        )
    }

    /// Finds the node owning exactly `[begin, begin + count)` below (or at) this one.
    ///
    /// Every node is uniquely identified by these two numbers, which makes them usable as an
    /// address once pointers are meaningless, e.g. after a subtree crossed the wire.
    pub fn find_by_begin_count(&self, begin: usize, count: usize) -> Option<Self> {

        let mut curr = *self;

        if begin < curr.begin() || begin.checked_add(count).map_or(true, |end| end > curr.end()) {
            return None;
        }

        loop {
            if curr.begin() == begin && curr.count() == count {
                return Some(curr);
            }

            let left = curr.left()?;
            curr = match begin < left.end() {
                true => left,
                false => curr.right()?,
            };
        }
    }
}

impl<'a, B: Bound, S> NodeRef<'a, B, S> {

    pub fn centroid(&self) -> Vec<f64> {
        self.bound().centroid()
    }

    /// Distance from the centroid to the furthest point held directly; 0 for internal nodes.
    pub fn furthest_point_distance(&self) -> f64 {
        match self.is_leaf() {
            true => 0.5 * self.bound().diameter(),
            false => 0.0,
        }
    }

    /// Distance from the centroid to the nearest edge of the bound.
    pub fn minimum_bound_distance(&self) -> f64 {
        self.bound().min_width() / 2.0
    }
}
