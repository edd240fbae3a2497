//! Binary space partitioning trees with single-process and distributed dual-tree traversal.
//!
//! A tree is built top-down over a copy of a column-major dataset: every node owns a contiguous
//! range of columns, and building reorders the copy so that it does. Nodes live in an arena on
//! the [`tree::Tree`] and refer to each other by [`node::NodeId`]; a [`node::NodeRef`] is the
//! borrowed view every query works with. The shape of a node's region is a [`bound::Bound`]
//! (hyper-rectangle for kd trees, ball for ball trees) and how a node is split is a
//! [`split::Splitter`].
//!
//! Problems are expressed as a [`rule::Rule`] and run by the [`traversal::DualTreeTraverser`],
//! or by [`distributed::DistributedTraversal`], which hands the lower levels of the recursion to
//! a group of workers, in-process or behind any other [`distributed::transport::WorkerTransport`].
//! Trees cross process boundaries and reach disk as a [`archive::TreeArchive`].
pub mod archive;
pub mod bound;
pub mod builder;
pub mod config;
pub mod dataset;
pub mod distributed;
pub mod error;
pub mod io;
pub mod layout;
pub mod metric;
pub mod node;
pub mod rule;
pub mod single;
pub mod split;
pub mod statistic;
pub mod traversal;
pub mod tree;
