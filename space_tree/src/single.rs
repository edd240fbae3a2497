//! Traversal of one query point against a reference tree.
//!
//! Descends nearest child first. Pending siblings are scored again right before they are
//! expanded, so anything found in the meantime can still prune them.

use log::debug;
use std::collections::VecDeque;

use crate::dataset::Point;
use crate::node::NodeRef;
use crate::rule::Score;

pub trait SingleTreeRule<B, S> {

    fn score(&mut self, query: Point<'_>, reference: NodeRef<'_, B, S>) -> Score;

    fn base_case(&mut self, query: Point<'_>, reference: Point<'_>);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SingleTraversalStats {
    pub nodes_visited: usize,
    pub leaves_visited: usize,
    pub prunes: usize,
    pub base_cases: usize,
}

pub struct SingleTreeTraverser<'r, R> {
    rule: &'r mut R,
    stats: SingleTraversalStats,
}

impl<'r, R> SingleTreeTraverser<'r, R> {

    pub fn new(rule: &'r mut R) -> Self {
        Self {
            rule,
            stats: SingleTraversalStats::default(),
        }
    }

    pub fn stats(&self) -> SingleTraversalStats {
        self.stats
    }

    pub fn traverse<B, S>(&mut self, query: Point<'_>, reference: NodeRef<'_, B, S>)
    where
        R: SingleTreeRule<B, S>,
    {
        let mut nodes_to_check: VecDeque<NodeRef<'_, B, S>> = VecDeque::new();
        nodes_to_check.push_front(reference);

        while let Some(node) = nodes_to_check.pop_front() {

            self.stats.nodes_visited += 1;

            let score = match self.rule.score(query, node) {
                Score::Prune => {
                    self.stats.prunes += 1;
                    continue;
                }
                Score::Visit(x) => x,
            };

            let (left, right) = match node.left().zip(node.right()) {
                Some(x) => x,
                None => {
                    self.stats.leaves_visited += 1;
                    for r in node.points() {
                        self.rule.base_case(query, r);
                        self.stats.base_cases += 1;
                    }
                    continue;
                }
            };

            let left_score = self.rule.score(query, left);
            let right_score = self.rule.score(query, right);

            //better child ends up at the front
            let (near, far) = match (left_score, right_score) {
                (Score::Visit(l), Score::Visit(r)) if r < l => (right, left),
                (Score::Prune, Score::Visit(_)) => (right, left),
                _ => (left, right),
            };

            nodes_to_check.push_front(far);
            nodes_to_check.push_front(near);

            debug!("{:?} scored {}, expanding", node, score);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bound::Bound;
    use crate::dataset::Dataset;
    use crate::metric::{EuclideanDistance, Metric};
    use crate::tree::{BallTree, KdTree, Tree};
    use assert_approx_eq::assert_approx_eq;

    /// Keeps the `k` nearest reference points, sorted by distance.
    struct KNearest {
        k: usize,
        hits: Vec<(f64, usize)>,
    }

    impl KNearest {
        fn new(k: usize) -> Self {
            Self { k, hits: Vec::new() }
        }

        fn threshold(&self) -> f64 {
            match self.hits.len() < self.k {
                true => f64::MAX,
                false => self.hits[self.k - 1].0,
            }
        }
    }

    impl<B: Bound, S> SingleTreeRule<B, S> for KNearest {

        fn score(&mut self, query: Point<'_>, reference: NodeRef<'_, B, S>) -> Score {
            let distance = reference.bound().min_distance_to_point(query.coords);
            match distance > self.threshold() {
                true => Score::Prune,
                false => Score::Visit(distance),
            }
        }

        fn base_case(&mut self, query: Point<'_>, reference: Point<'_>) {
            let distance = EuclideanDistance.evaluate(query.coords, reference.coords);
            if distance >= self.threshold() {
                return;
            }
            let position = self.hits.partition_point(|x| x.0 <= distance);
            self.hits.insert(position, (distance, reference.index));
            self.hits.truncate(self.k);
        }
    }

    fn brute_force(query: &[f64], data: &Dataset, k: usize) -> Vec<f64> {
        let mut distances: Vec<f64> = (0..data.n_cols())
            .map(|i| EuclideanDistance.evaluate(query, data.column(i)))
            .collect();
        distances.sort_by(|a, b| a.total_cmp(b));
        distances.truncate(k);
        distances
    }

    #[test]
    fn k_nearest_matches_brute_force() {

        let tree: KdTree = Tree::build(&Dataset::random(4, 1000).unwrap(), 10).unwrap();
        let queries = Dataset::random(4, 25).unwrap();

        for i in 0..queries.n_cols() {
            let mut rule = KNearest::new(5);
            let mut traverser = SingleTreeTraverser::new(&mut rule);
            traverser.traverse(queries.point(i), tree.root());
            let stats = traverser.stats();

            assert!(stats.base_cases < 1000);

            let expected = brute_force(queries.column(i), tree.dataset(), 5);
            assert_eq!(rule.hits.len(), 5);
            for (found, truth) in rule.hits.iter().zip(expected) {
                assert_approx_eq!(found.0, truth);
            }
        }
    }

    #[test]
    fn ball_tree_finds_an_exact_match() {

        let tree: BallTree = Tree::build(&Dataset::random(3, 300).unwrap(), 8).unwrap();
        let target = tree.dataset().point(123);

        let mut rule = KNearest::new(1);
        SingleTreeTraverser::new(&mut rule).traverse(target, tree.root());

        assert_eq!(rule.hits[0].1, 123);
        assert_approx_eq!(rule.hits[0].0, 0.0);
    }
}
