//! Routing of dispatched node pairs to workers.
//!
//! Every dual recursion step goes one of four ways (LL, LR, RL, RR), i.e. two bits. The
//! identifier of a pair is built from the steps between the roots and the pair, root-most step
//! in the lowest two bits, plus one since index 0 is the coordinator. Only pairs reached
//! through dual steps on a fully balanced recursion get distinct identifiers.

use crate::node::NodeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Left,
    Right,
}

impl Branch {

    fn of<B, S>(node: NodeRef<'_, B, S>) -> Self {
        match node.is_right_child() {
            true => Branch::Right,
            false => Branch::Left,
        }
    }

    fn bit(&self) -> usize {
        match self {
            Branch::Left => 0,
            Branch::Right => 1,
        }
    }
}

/// Identifier of the pair reached through `steps` (query branch, reference branch), root-most
/// step first.
pub fn path_identifier(steps: &[(Branch, Branch)]) -> usize {

    let index: usize = steps
        .iter()
        .enumerate()
        .map(|(level, (query, reference))| (2 * query.bit() + reference.bit()) << (2 * level))
        .sum();

    index + 1
}

/// Steps leading to a pair, found by walking both nodes up while each still has a parent.
pub fn path_of<B, S>(query: NodeRef<'_, B, S>, reference: NodeRef<'_, B, S>) -> Vec<(Branch, Branch)> {

    let mut steps: Vec<(Branch, Branch)> = Vec::new();

    let mut curr_query = query;
    let mut curr_reference = reference;
    while let (Some(query_parent), Some(reference_parent)) = (curr_query.parent(), curr_reference.parent()) {
        steps.push((Branch::of(curr_query), Branch::of(curr_reference)));
        curr_query = query_parent;
        curr_reference = reference_parent;
    }

    steps.reverse();
    steps
}

/// Worker a dispatched pair is sent to.
pub fn target_for<B, S>(query: NodeRef<'_, B, S>, reference: NodeRef<'_, B, S>) -> usize {
    path_identifier(&path_of(query, reference))
}

/// Number of dual levels the coordinator recurses through before dispatching to `workers`
/// workers: `ceil(ceil(log2(workers)) / 2)`.
pub fn dispatch_depth(workers: usize) -> usize {

    if workers <= 1 {
        return 0;
    }

    let bits = (usize::BITS - (workers - 1).leading_zeros()) as usize;
    (bits + 1) / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::tree::{KdTree, Tree};
    use Branch::{Left, Right};

    #[test]
    fn identifiers_of_hand_traced_paths() {

        //query R then L, reference L then R
        assert_eq!(path_identifier(&[(Right, Left), (Left, Right)]), 7);

        assert_eq!(path_identifier(&[]), 1);
        assert_eq!(path_identifier(&[(Right, Left)]), 3);
        assert_eq!(path_identifier(&[(Right, Right)]), 4);
        assert_eq!(path_identifier(&[(Left, Left), (Left, Left)]), 1);
        assert_eq!(path_identifier(&[(Right, Right), (Right, Right)]), 16);
        assert_eq!(path_identifier(&[(Left, Right), (Right, Left)]), 2 + (2 << 2));
    }

    #[test]
    fn balanced_levels_cover_every_worker_once() {

        for depth in [1, 2, 3] {
            let mut seen: Vec<usize> = Vec::new();
            let all = [(Left, Left), (Left, Right), (Right, Left), (Right, Right)];

            let mut paths: Vec<Vec<(Branch, Branch)>> = vec![vec![]];
            for _ in 0..depth {
                paths = paths
                    .into_iter()
                    .flat_map(|p| all.iter().map(move |s| [p.clone(), vec![*s]].concat()))
                    .collect();
            }
            for p in paths {
                seen.push(path_identifier(&p));
            }

            seen.sort();
            let expected: Vec<usize> = (1..=4usize.pow(depth)).collect();
            assert_eq!(seen, expected);
        }
    }

    #[test]
    fn depth_for_worker_counts() {

        assert_eq!(dispatch_depth(1), 0);
        assert_eq!(dispatch_depth(2), 1);
        assert_eq!(dispatch_depth(3), 1);
        assert_eq!(dispatch_depth(4), 1);
        assert_eq!(dispatch_depth(5), 2);
        assert_eq!(dispatch_depth(16), 2);
        assert_eq!(dispatch_depth(17), 3);
        assert_eq!(dispatch_depth(64), 3);
    }

    #[test]
    fn path_of_nodes_in_a_tree() {

        let tree: KdTree = Tree::build(&Dataset::random(2, 256).unwrap(), 4).unwrap();
        let root = tree.root();
        let (l, r) = (root.left().unwrap(), root.right().unwrap());

        assert!(path_of(root, root).is_empty());
        assert_eq!(target_for(root, root), 1);
        assert_eq!(path_of(r, l), vec![(Right, Left)]);

        //query R then L, reference L then R
        let query = r.left().unwrap();
        let reference = l.right().unwrap();
        assert_eq!(path_of(query, reference), vec![(Right, Left), (Left, Right)]);
        assert_eq!(target_for(query, reference), 7);

        //walking stops at the shallower node
        assert_eq!(path_of(root, reference), vec![]);
        assert_eq!(path_of(r, reference), vec![(Right, Right)]);
    }
}
