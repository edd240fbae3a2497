//! Bounding regions covering the points of a node.
//!
//! The tree only talks to its bound through [`Bound`]; the two shapes shipped here are an
//! axis-aligned hyper-rectangle and a ball.

pub mod ball;
pub mod hrect;

pub use ball::BallBound;
pub use hrect::HRectBound;

use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

use crate::dataset::Dataset;
use crate::metric::Metric;

pub trait Bound: Clone + Debug + Serialize + DeserializeOwned + Send + Sync {
    type Metric: Metric;

    /// A bound of dimension `dim` that contains nothing.
    fn empty(dim: usize) -> Self;

    fn dim(&self) -> usize;

    fn metric(&self) -> &Self::Metric;

    /// Grow the bound to cover columns `[begin, begin + count)` of `data`.
    fn union_columns(&mut self, data: &Dataset, begin: usize, count: usize);

    fn contains(&self, point: &[f64]) -> bool;

    fn centroid(&self) -> Vec<f64>;

    fn diameter(&self) -> f64;

    fn min_width(&self) -> f64;

    fn min_distance(&self, other: &Self) -> f64;

    fn max_distance(&self, other: &Self) -> f64;

    fn min_distance_to_point(&self, point: &[f64]) -> f64;

    fn max_distance_to_point(&self, point: &[f64]) -> f64;
}
