//! Ball bound, the ball-tree bound.

use serde::{Deserialize, Serialize};

use crate::bound::Bound;
use crate::dataset::Dataset;
use crate::metric::{EuclideanDistance, Metric};

/// Ball of `radius` around `center`. A negative radius marks an empty ball.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallBound<M = EuclideanDistance> {
    center: Vec<f64>,
    radius: f64,
    metric: M,
}

impl<M: Metric> BallBound<M> {

    pub fn center(&self) -> &[f64] {
        &self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    fn is_empty(&self) -> bool {
        self.radius < 0.0
    }
}

impl<M: Metric> Bound for BallBound<M> {
    type Metric = M;

    fn empty(dim: usize) -> Self {
        Self {
            center: vec![0.0; dim],
            radius: -1.0,
            metric: M::default(),
        }
    }

    fn dim(&self) -> usize {
        self.center.len()
    }

    fn metric(&self) -> &M {
        &self.metric
    }

    /// Grows the ball just enough to reach each point that falls outside, moving the center
    /// towards it. Not the minimum enclosing ball, but always a covering one.
    fn union_columns(&mut self, data: &Dataset, begin: usize, count: usize) {

        for i in begin..begin + count {
            let point = data.column(i);

            if self.is_empty() {
                self.center = point.to_vec();
                self.radius = 0.0;
                continue;
            }

            let dist = self.metric.evaluate(&self.center, point);
            if dist > self.radius {
                let shift = (dist - self.radius) / (2.0 * dist);
                for (c, p) in self.center.iter_mut().zip(point) {
                    *c += shift * (p - *c);
                }
                self.radius = 0.5 * (dist + self.radius);
            }
        }
    }

    fn contains(&self, point: &[f64]) -> bool {
        !self.is_empty() && self.metric.evaluate(&self.center, point) <= self.radius
    }

    fn centroid(&self) -> Vec<f64> {
        self.center.clone()
    }

    fn diameter(&self) -> f64 {
        2.0 * self.radius.max(0.0)
    }

    fn min_width(&self) -> f64 {
        self.diameter()
    }

    fn min_distance(&self, other: &Self) -> f64 {

        if self.is_empty() || other.is_empty() {
            return f64::MAX;
        }

        let dist = self.metric.evaluate(&self.center, &other.center);
        (dist - self.radius - other.radius).max(0.0)
    }

    fn max_distance(&self, other: &Self) -> f64 {
        self.metric.evaluate(&self.center, &other.center) + self.radius.max(0.0) + other.radius.max(0.0)
    }

    fn min_distance_to_point(&self, point: &[f64]) -> f64 {

        if self.is_empty() {
            return f64::MAX;
        }

        (self.metric.evaluate(&self.center, point) - self.radius).max(0.0)
    }

    fn max_distance_to_point(&self, point: &[f64]) -> f64 {
        self.metric.evaluate(&self.center, point) + self.radius.max(0.0)
    }
}
