//! Single-process dual-tree recursion.

use log::debug;

use crate::node::NodeRef;
use crate::rule::Rule;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    pub visited: usize,
    pub scores: usize,
    pub prunes: usize,
    pub base_cases: usize,
}

/// Walks every unpruned pair of nodes of a query and a reference tree.
///
/// The traverser keeps no state besides its counters, so one instance can be reused for
/// several traversals with the same rule.
pub struct DualTreeTraverser<'r, R> {
    rule: &'r mut R,
    stats: TraversalStats,
}

impl<'r, R> DualTreeTraverser<'r, R> {

    pub fn new(rule: &'r mut R) -> Self {
        Self {
            rule,
            stats: TraversalStats::default(),
        }
    }

    pub fn stats(&self) -> TraversalStats {
        self.stats
    }

    pub fn traverse<B, S>(&mut self, query: NodeRef<'_, B, S>, reference: NodeRef<'_, B, S>)
    where
        R: Rule<B, S>,
    {
        let before = self.stats;
        self.recurse(query, reference);

        debug!(
            "traversal of {:?} x {:?}: {} pairs visited, {} scored, {} pruned, {} base cases",
            query,
            reference,
            self.stats.visited - before.visited,
            self.stats.scores - before.scores,
            self.stats.prunes - before.prunes,
            self.stats.base_cases - before.base_cases,
        );
    }

    fn recurse<B, S>(&mut self, query: NodeRef<'_, B, S>, reference: NodeRef<'_, B, S>)
    where
        R: Rule<B, S>,
    {
        self.stats.visited += 1;
        self.stats.scores += 1;

        if self.rule.score(query, reference).is_prune() {
            self.stats.prunes += 1;
            return;
        }

        //only leaf x leaf pairs hold points on both sides
        for q in query.points() {
            for r in reference.points() {
                self.rule.base_case(q, r);
                self.stats.base_cases += 1;
            }
        }

        match (query.left().zip(query.right()), reference.left().zip(reference.right())) {
            (Some((ql, qr)), Some((rl, rr))) => {
                self.recurse(ql, rl);
                self.recurse(ql, rr);
                self.recurse(qr, rl);
                self.recurse(qr, rr);
            }
            (Some((ql, qr)), None) => {
                self.recurse(ql, reference);
                self.recurse(qr, reference);
            }
            (None, Some((rl, rr))) => {
                self.recurse(query, rl);
                self.recurse(query, rr);
            }
            (None, None) => {}
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::bound::Bound;
    use crate::dataset::{Dataset, Point};
    use crate::metric::{EuclideanDistance, Metric};
    use crate::rule::{Score, TaskRule};
    use crate::tree::{BallTree, KdTree, Tree};
    use serde::{Deserialize, Serialize};

    /// Counts every point pair it is shown.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub(crate) struct CountRule {
        pub(crate) pairs: u64,
    }

    impl<B, S> Rule<B, S> for CountRule {
        type Results = u64;

        fn score(&mut self, _query: NodeRef<'_, B, S>, _reference: NodeRef<'_, B, S>) -> Score {
            Score::Visit(0.0)
        }

        fn base_case(&mut self, _query: Point<'_>, _reference: Point<'_>) {
            self.pairs += 1;
        }

        fn results(&self) -> &u64 {
            &self.pairs
        }

        fn into_results(self) -> u64 {
            self.pairs
        }

        fn merge(&mut self, results: u64) {
            self.pairs += results;
        }
    }

    impl<B, S> TaskRule<B, S> for CountRule {
        fn task_rule(&self) -> Self {
            CountRule::default()
        }
    }

    /// Nearest reference neighbor of every query point, pruning on the best distance so far.
    ///
    /// Results are keyed by absolute query index. `best` is the (distance, reference index) of
    /// the closest neighbor found; merging keeps the closer one.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub(crate) struct NearestRule {
        pub(crate) best: Vec<(f64, usize)>,
    }

    impl NearestRule {
        pub(crate) fn new(n_query: usize) -> Self {
            Self {
                best: vec![(f64::MAX, usize::MAX); n_query],
            }
        }

        fn worst_in(&self, begin: usize, end: usize) -> f64 {
            self.best[begin..end].iter().map(|x| x.0).fold(0.0, f64::max)
        }
    }

    impl<B: Bound, S> Rule<B, S> for NearestRule {
        type Results = Vec<(f64, usize)>;

        fn score(&mut self, query: NodeRef<'_, B, S>, reference: NodeRef<'_, B, S>) -> Score {
            let distance = query.bound().min_distance(reference.bound());
            match distance > self.worst_in(query.begin(), query.end()) {
                true => Score::Prune,
                false => Score::Visit(distance),
            }
        }

        fn base_case(&mut self, query: Point<'_>, reference: Point<'_>) {
            let distance = EuclideanDistance.evaluate(query.coords, reference.coords);
            let slot = &mut self.best[query.index];
            if (distance, reference.index) < *slot {
                *slot = (distance, reference.index);
            }
        }

        fn results(&self) -> &Self::Results {
            &self.best
        }

        fn into_results(self) -> Self::Results {
            self.best
        }

        fn merge(&mut self, results: Self::Results) {
            for (slot, other) in self.best.iter_mut().zip(results) {
                if other < *slot {
                    *slot = other;
                }
            }
        }
    }

    impl<B: Bound, S> TaskRule<B, S> for NearestRule {
        fn task_rule(&self) -> Self {
            NearestRule::new(self.best.len())
        }
    }

    pub(crate) fn brute_force_nearest(query: &Dataset, reference: &Dataset) -> Vec<f64> {
        (query.first_column()..query.end_column())
            .map(|q| {
                (reference.first_column()..reference.end_column())
                    .map(|r| EuclideanDistance.evaluate(query.column(q), reference.column(r)))
                    .fold(f64::MAX, f64::min)
            })
            .collect()
    }

    #[test]
    fn counting_rule_sees_every_pair() {

        let query: KdTree = Tree::build(&Dataset::random(3, 120).unwrap(), 7).unwrap();
        let reference: KdTree = Tree::build(&Dataset::random(3, 85).unwrap(), 4).unwrap();

        let mut rule = CountRule::default();
        let mut traverser = DualTreeTraverser::new(&mut rule);
        traverser.traverse(query.root(), reference.root());
        let stats = traverser.stats();

        assert_eq!(rule.pairs, 120 * 85);
        assert_eq!(stats.base_cases, 120 * 85);
        assert_eq!(stats.prunes, 0);
    }

    #[test]
    fn counting_a_tree_against_itself() {

        let tree: BallTree = Tree::build(&Dataset::random(2, 64).unwrap(), 5).unwrap();

        let mut rule = CountRule::default();
        DualTreeTraverser::new(&mut rule).traverse(tree.root(), tree.root());

        assert_eq!(rule.pairs, 64 * 64);
    }

    #[test]
    fn uneven_depths_still_cover_every_pair() {

        //a single leaf against a deep tree exercises the one-sided recursion
        let query: KdTree = Tree::build(&Dataset::random(2, 3).unwrap(), 10).unwrap();
        let reference: KdTree = Tree::build(&Dataset::random(2, 200).unwrap(), 2).unwrap();
        assert!(query.root().is_leaf());

        let mut rule = CountRule::default();
        DualTreeTraverser::new(&mut rule).traverse(query.root(), reference.root());
        assert_eq!(rule.pairs, 3 * 200);

        let mut rule = CountRule::default();
        DualTreeTraverser::new(&mut rule).traverse(reference.root(), query.root());
        assert_eq!(rule.pairs, 200 * 3);
    }

    #[test]
    fn pruning_nearest_neighbor_matches_brute_force() {

        let query_data = Dataset::random(3, 150).unwrap();
        let reference_data = Dataset::random(3, 400).unwrap();

        let query: KdTree = Tree::build(&query_data, 5).unwrap();
        let reference: KdTree = Tree::build(&reference_data, 5).unwrap();

        let mut rule = NearestRule::new(150);
        let mut traverser = DualTreeTraverser::new(&mut rule);
        traverser.traverse(query.root(), reference.root());
        let stats = traverser.stats();

        assert!(stats.prunes > 0);
        assert!(stats.base_cases < 150 * 400);

        let expected = brute_force_nearest(query.dataset(), reference.dataset());
        for (found, truth) in rule.best.iter().zip(expected) {
            assert_approx_eq::assert_approx_eq!(found.0, truth);
        }
    }
}
