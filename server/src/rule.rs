//! Range counting: for every query point, how many reference points lie within a radius.

use serde::{Deserialize, Serialize};

use space_tree::bound::Bound;
use space_tree::dataset::Point;
use space_tree::metric::Metric;
use space_tree::node::NodeRef;
use space_tree::rule::{Rule, Score, TaskRule};
use space_tree::statistic::Statistic;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeCountRule {
    radius: f64,
    counts: Vec<u64>,
}

impl RangeCountRule {

    /// Counts are indexed by absolute query column, so `n_query` is the size of the full query
    /// tree.
    pub fn new(radius: f64, n_query: usize) -> Self {
        Self {
            radius,
            counts: vec![0; n_query],
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

impl<B: Bound, S: Statistic> Rule<B, S> for RangeCountRule {
    type Results = Vec<u64>;

    fn score(&mut self, query: NodeRef<'_, B, S>, reference: NodeRef<'_, B, S>) -> Score {
        let distance = query.bound().min_distance(reference.bound());
        match distance > self.radius {
            true => Score::Prune,
            false => Score::Visit(distance),
        }
    }

    fn base_case(&mut self, query: Point<'_>, reference: Point<'_>) {
        let metric = B::Metric::default();
        if metric.evaluate(query.coords, reference.coords) <= self.radius {
            self.counts[query.index] += 1;
        }
    }

    fn results(&self) -> &Vec<u64> {
        &self.counts
    }

    fn into_results(self) -> Vec<u64> {
        self.counts
    }

    fn merge(&mut self, results: Vec<u64>) {
        for (count, other) in self.counts.iter_mut().zip(results) {
            *count += other;
        }
    }
}

impl<B: Bound, S: Statistic> TaskRule<B, S> for RangeCountRule {
    fn task_rule(&self) -> Self {
        RangeCountRule::new(self.radius, self.counts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use space_tree::bound::HRectBound;
    use space_tree::dataset::Dataset;
    use space_tree::metric::EuclideanDistance;
    use space_tree::statistic::EmptyStatistic;
    use space_tree::traversal::DualTreeTraverser;
    use space_tree::tree::{KdTree, Tree};

    #[test]
    fn counts_match_brute_force() {

        let tree: KdTree = Tree::build(&Dataset::random(2, 400).unwrap(), 8).unwrap();
        let data = tree.dataset();

        let mut rule = RangeCountRule::new(0.05, 400);
        let mut traverser = DualTreeTraverser::new(&mut rule);
        traverser.traverse(tree.root(), tree.root());
        assert!(traverser.stats().prunes > 0);

        for q in 0..400 {
            let expected = (0..400)
                .filter(|r| EuclideanDistance.evaluate(data.column(q), data.column(*r)) <= 0.05)
                .count() as u64;
            assert_eq!(rule.counts()[q], expected);
        }
    }

    #[test]
    fn task_rule_starts_empty_and_merge_adds() {

        let mut rule = RangeCountRule::new(1.5, 3);
        rule.counts = vec![1, 2, 3];

        let fresh = <RangeCountRule as TaskRule<HRectBound, EmptyStatistic>>::task_rule(&rule);
        assert_eq!(fresh.counts(), &[0, 0, 0]);
        assert_approx_eq::assert_approx_eq!(fresh.radius(), 1.5);

        <RangeCountRule as Rule<HRectBound, EmptyStatistic>>::merge(&mut rule, vec![4, 0, 1]);
        assert_eq!(rule.counts(), &[5, 2, 4]);
        assert_eq!(rule.total(), 11);
    }
}
