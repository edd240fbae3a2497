//! Problem-specific logic plugged into the traversers.

use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

use crate::dataset::Point;
use crate::node::NodeRef;

/// Outcome of scoring a pair of nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    /// Nothing below this pair can change the results.
    Prune,
    /// Keep descending; lower values are more promising.
    Visit(f64),
}

impl Score {

    pub fn is_prune(&self) -> bool {
        matches!(self, Score::Prune)
    }
}

/// A dual-tree problem: scores node pairs, evaluates point pairs and owns the result store.
pub trait Rule<B, S> {

    type Results: Clone + Debug + Serialize + DeserializeOwned + Send;

    fn score(&mut self, query: NodeRef<'_, B, S>, reference: NodeRef<'_, B, S>) -> Score;

    fn base_case(&mut self, query: Point<'_>, reference: Point<'_>);

    fn results(&self) -> &Self::Results;

    fn into_results(self) -> Self::Results;

    /// Folds results produced elsewhere into this rule's store. Must be commutative and
    /// associative, since worker results arrive in any grouping.
    fn merge(&mut self, results: Self::Results);
}

/// A rule that can be shipped to a worker process.
pub trait TaskRule<B, S>: Rule<B, S> + Clone + Serialize + DeserializeOwned + Send + 'static {

    /// Copy of this rule's parameters with an empty result store.
    fn task_rule(&self) -> Self;
}
