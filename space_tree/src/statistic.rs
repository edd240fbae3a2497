//! Per-node auxiliary data built once a node's subtree is complete.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Debug;

use crate::bound::Bound;
use crate::node::NodeRef;

/// Statistics are built children-first, so `from_node` may read the statistics of the node's
/// children. `Default` is only used as a placeholder while the subtree is being built.
pub trait Statistic: Clone + Debug + Default + Serialize + DeserializeOwned + Send + Sync {

    fn from_node<B: Bound>(node: NodeRef<'_, B, Self>) -> Self;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyStatistic;

impl Statistic for EmptyStatistic {

    fn from_node<B: Bound>(_node: NodeRef<'_, B, Self>) -> Self {
        EmptyStatistic
    }
}
