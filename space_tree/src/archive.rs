//! Persisted and transferred form of a tree.
//!
//! An archive is a flat list of node records in pre-order, root first, with children referenced
//! by record index, plus the dataset. Parent links are not stored; they are rebuilt on load.
//! Loading goes through [`Tree::from_archive`], which validates the whole node graph before a
//! tree is handed out.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::bound::Bound;
use crate::dataset::Dataset;
use crate::error::Error;
use crate::node::{Node, NodeId, NodeRef};
use crate::statistic::Statistic;
use crate::tree::Tree;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord<B, S> {
    pub begin: usize,
    pub count: usize,
    pub bound: B,
    pub statistic: S,
    pub parent_distance: f64,
    pub furthest_descendant_distance: f64,
    pub left: Option<usize>,
    pub right: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeArchive<B, S> {
    pub dataset: Dataset,
    pub nodes: Vec<NodeRecord<B, S>>,
}

impl<B: Bound, S: Statistic> TreeArchive<B, S> {

    pub fn to_json(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, Error> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl<B: Bound, S: Statistic> Tree<B, S> {

    /// Archive of the whole tree.
    ///
    /// `max_depth == 0` keeps every level; otherwise only the first `max_depth` levels are kept
    /// (the root is level 1) and nodes on the last kept level are stored as leaves.
    pub fn to_archive(&self, max_depth: usize) -> TreeArchive<B, S> {

        let mut nodes: Vec<NodeRecord<B, S>> = Vec::with_capacity(self.num_nodes());
        record_subtree(self.root(), 1, max_depth, &mut nodes);

        TreeArchive {
            dataset: self.dataset().clone(),
            nodes,
        }
    }

    /// Archive of the subtree below `id`, carrying only the columns that subtree owns. The
    /// columns keep their absolute indices.
    pub fn subtree_archive(&self, id: NodeId, max_depth: usize) -> Result<TreeArchive<B, S>, Error> {

        let top = match self.node(id) {
            None => return Err(Error::InvalidArgument(format!("{} is not in the tree", id))),
            Some(x) => x,
        };

        let mut nodes: Vec<NodeRecord<B, S>> = Vec::new();
        record_subtree(top, 1, max_depth, &mut nodes);

        Ok(TreeArchive {
            dataset: self.dataset().columns(top.begin(), top.count())?,
            nodes,
        })
    }

    pub fn from_archive(archive: TreeArchive<B, S>) -> Result<Self, Error> {

        let TreeArchive { dataset, nodes: records } = archive;

        if records.is_empty() {
            return Err(Error::MalformedArchive("archive holds no nodes".to_string()));
        }

        let n = records.len();
        let mut parents: Vec<Option<usize>> = vec![None; n];

        for (i, record) in records.iter().enumerate() {

            if !dataset.holds(record.begin, record.count) {
                return Err(Error::MalformedArchive(format!(
                    "node {} owns {} columns from {}, outside the dataset",
                    i,
                    record.count,
                    record.begin
                )));
            }

            if record.bound.dim() != dataset.dim() {
                return Err(Error::MalformedArchive(format!(
                    "node {} has a bound of dimension {} over a dataset of dimension {}",
                    i,
                    record.bound.dim(),
                    dataset.dim()
                )));
            }

            let (left, right) = match (record.left, record.right) {
                (None, None) => continue,
                (Some(l), Some(r)) => (l, r),
                _ => return Err(Error::MalformedArchive(format!("node {} has exactly one child", i))),
            };

            for child in [left, right] {
                //children after parents rules out cycles
                if child <= i || child >= n {
                    return Err(Error::MalformedArchive(format!("node {} links to invalid child {}", i, child)));
                }
                if parents[child].is_some() {
                    return Err(Error::MalformedArchive(format!("node {} has two parents", child)));
                }
                parents[child] = Some(i);
            }

            let (l, r) = (&records[left], &records[right]);
            let tiled = l.begin == record.begin
                && l.begin.checked_add(l.count) == Some(r.begin)
                && l.count.checked_add(r.count) == Some(record.count);
            if !tiled {
                return Err(Error::MalformedArchive(format!("children of node {} do not split its range", i)));
            }
        }

        if let Some(orphan) = (1..n).find(|i| parents[*i].is_none()) {
            return Err(Error::MalformedArchive(format!("node {} is not reachable from the root", orphan)));
        }

        let nodes: Vec<Node<B, S>> = records
            .into_iter()
            .zip(parents)
            .map(|(record, parent)| Node {
                begin: record.begin,
                count: record.count,
                bound: record.bound,
                stat: record.statistic,
                parent_distance: record.parent_distance,
                furthest_descendant_distance: record.furthest_descendant_distance,
                parent: parent.map(NodeId),
                left: record.left.map(NodeId),
                right: record.right.map(NodeId),
            })
            .collect();

        Ok(Tree::from_arena(dataset, nodes))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P, max_depth: usize) -> Result<(), Error> {

        let bytes = self.to_archive(max_depth).to_json()?;
        std::fs::write(path, bytes)?;

        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {

        let bytes = std::fs::read(path)?;
        Self::from_archive(TreeArchive::from_json(&bytes)?)
    }
}

/// Appends `node` and (depth permitting) its subtree in pre-order; returns the node's index.
fn record_subtree<B: Bound, S: Statistic>(
    node: NodeRef<'_, B, S>,
    level: usize,
    max_depth: usize,
    out: &mut Vec<NodeRecord<B, S>>,
) -> usize {

    let index = out.len();
    out.push(NodeRecord {
        begin: node.begin(),
        count: node.count(),
        bound: node.bound().clone(),
        statistic: node.stat().clone(),
        parent_distance: node.parent_distance(),
        furthest_descendant_distance: node.furthest_descendant_distance(),
        left: None,
        right: None,
    });

    if max_depth != 0 && level >= max_depth {
        return index;
    }

    if let (Some(left), Some(right)) = (node.left(), node.right()) {
        let left_index = record_subtree(left, level + 1, max_depth, out);
        let right_index = record_subtree(right, level + 1, max_depth, out);
        out[index].left = Some(left_index);
        out[index].right = Some(right_index);
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::KdTree;

    fn assert_same_nodes(a: &KdTree, b: &KdTree) {

        assert_eq!(a.num_nodes(), b.num_nodes());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!((x.begin(), x.count()), (y.begin(), y.count()));
            assert_eq!(x.num_children(), y.num_children());
            assert_eq!(x.parent().map(|p| p.id()), y.parent().map(|p| p.id()));
            assert_eq!(x.parent_distance(), y.parent_distance());
            if x.is_leaf() {
                assert_eq!(x.bound(), y.bound());
            }
        }
    }

    #[test]
    fn full_round_trip() {

        let tree: KdTree = Tree::build(&Dataset::random(3, 400).unwrap(), 10).unwrap();

        let bytes = tree.to_archive(0).to_json().unwrap();
        let loaded: KdTree = Tree::from_archive(TreeArchive::from_json(&bytes).unwrap()).unwrap();

        assert_same_nodes(&tree, &loaded);
        assert_eq!(tree.dataset(), loaded.dataset());
        assert_eq!(loaded.root().tree_depth(), tree.root().tree_depth());
    }

    #[test]
    fn depth_limited_save_drops_deep_levels() {

        let tree: KdTree = Tree::build(&Dataset::random(2, 500).unwrap(), 4).unwrap();
        assert!(tree.root().tree_depth() > 3);

        for k in [1, 2, 3] {
            let loaded: KdTree = Tree::from_archive(tree.to_archive(k)).unwrap();
            assert_eq!(loaded.root().tree_depth(), k);
            assert_eq!(loaded.root().count(), 500);

            //kept nodes are unchanged, only their children are gone
            for node in loaded.iter() {
                let original = tree.find_by_begin_count(node.begin(), node.count()).unwrap();
                assert_eq!(original.parent_distance(), node.parent_distance());
            }
        }

        //the source tree is untouched by a limited save
        assert_eq!(tree.root().parent_distance(), 0.0);
        assert_eq!(tree.to_archive(0).nodes.len(), tree.num_nodes());
    }

    #[test]
    fn subtree_archive_keeps_absolute_indices() {

        let tree: KdTree = Tree::build(&Dataset::random(2, 300).unwrap(), 8).unwrap();
        let right = tree.root().right().unwrap();

        let archive = tree.subtree_archive(right.id(), 0).unwrap();
        let detached: KdTree = Tree::from_archive(archive).unwrap();

        let root = detached.root();
        assert_eq!((root.begin(), root.count()), (right.begin(), right.count()));
        assert!(root.parent().is_none());
        assert_eq!(root.tree_size(), right.tree_size());

        for i in right.begin()..right.end() {
            assert_eq!(detached.dataset().column(i), tree.dataset().column(i));
        }

        assert!(tree.subtree_archive(NodeId(tree.num_nodes()), 0).is_err());
    }

    #[test]
    fn malformed_archives_are_rejected() {

        let tree: KdTree = Tree::build(&Dataset::random(2, 64).unwrap(), 4).unwrap();
        let good = tree.to_archive(0);

        let mut empty = good.clone();
        empty.nodes.clear();
        assert!(Tree::from_archive(empty).is_err());

        let mut one_child = good.clone();
        one_child.nodes[0].right = None;
        assert!(Tree::from_archive(one_child).is_err());

        let mut cycle = good.clone();
        let last = cycle.nodes.len() - 1;
        cycle.nodes[last].left = Some(0);
        cycle.nodes[last].right = Some(1);
        assert!(Tree::from_archive(cycle).is_err());

        let mut bad_range = good.clone();
        bad_range.nodes[1].count += 1;
        assert!(Tree::from_archive(bad_range).is_err());

        let mut outside = good.clone();
        outside.nodes[0].count = 65;
        assert!(Tree::from_archive(outside).is_err());

        //begin + count wraps around
        let mut wrapping = good.clone();
        wrapping.nodes[0].begin = usize::MAX;
        wrapping.nodes[0].count = 2;
        assert!(Tree::from_archive(wrapping).is_err());

        let mut wrapping_child = good.clone();
        let left = wrapping_child.nodes[0].left.unwrap();
        wrapping_child.nodes[left].count = usize::MAX;
        assert!(Tree::from_archive(wrapping_child).is_err());

        let result: Result<KdTree, Error> = Tree::from_archive(good);
        assert!(result.is_ok());
    }

    #[test]
    fn save_and_load_file() {

        let tree: KdTree = Tree::build(&Dataset::random(2, 50).unwrap(), 5).unwrap();

        let path = std::env::temp_dir().join(format!("space_tree_archive_{}.json", std::process::id()));
        tree.save(&path, 0).unwrap();
        let loaded: KdTree = Tree::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_same_nodes(&tree, &loaded);
    }
}
