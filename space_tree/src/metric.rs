//! Distance metrics used by bounds and rules.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Debug;

/// A metric that can be evaluated between two points, and that can combine per-dimension gaps
/// into one distance (which is how bounds compute box-to-box distances).
pub trait Metric: Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync {

    /// Combine non-negative per-dimension gaps into a distance.
    fn accumulate<I: Iterator<Item = f64>>(&self, gaps: I) -> f64;

    fn evaluate(&self, a: &[f64], b: &[f64]) -> f64 {
        self.accumulate(a.iter().zip(b).map(|(x, y)| (x - y).abs()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EuclideanDistance;

impl Metric for EuclideanDistance {

    fn accumulate<I: Iterator<Item = f64>>(&self, gaps: I) -> f64 {
        gaps.map(|x| x * x).sum::<f64>().sqrt()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ManhattanDistance;

impl Metric for ManhattanDistance {

    fn accumulate<I: Iterator<Item = f64>>(&self, gaps: I) -> f64 {
        gaps.sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn known_distances() {

        let a = [0.0, 0.0];
        let b = [3.0, -4.0];

        assert_approx_eq!(EuclideanDistance.evaluate(&a, &b), 5.0);
        assert_approx_eq!(ManhattanDistance.evaluate(&a, &b), 7.0);
        assert_approx_eq!(EuclideanDistance.evaluate(&b, &b), 0.0);
    }
}
