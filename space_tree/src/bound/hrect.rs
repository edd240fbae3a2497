//! Axis-aligned hyper-rectangle bound, the kd-tree bound.

use serde::{Deserialize, Serialize};

use crate::bound::Bound;
use crate::dataset::Dataset;
use crate::metric::{EuclideanDistance, Metric};

/// Closed interval `[lo, hi]`. Empty intervals have `lo > hi`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub lo: f64,
    pub hi: f64,
}

impl Range {

    pub fn empty() -> Self {
        Self { lo: f64::MAX, hi: f64::MIN }
    }

    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    pub fn width(&self) -> f64 {
        match self.is_empty() {
            true => 0.0,
            false => self.hi - self.lo,
        }
    }

    pub fn mid(&self) -> f64 {
        (self.lo + self.hi) / 2.0
    }

    fn include(&mut self, value: f64) {
        if value < self.lo {
            self.lo = value;
        }
        if value > self.hi {
            self.hi = value;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HRectBound<M = EuclideanDistance> {
    ranges: Vec<Range>,
    min_width: f64,
    metric: M,
}

impl<M: Metric> HRectBound<M> {

    fn is_empty(&self) -> bool {
        self.ranges.iter().any(|r| r.is_empty())
    }
}

impl<M: Metric> Bound for HRectBound<M> {
    type Metric = M;

    fn empty(dim: usize) -> Self {
        Self {
            ranges: vec![Range::empty(); dim],
            min_width: 0.0,
            metric: M::default(),
        }
    }

    fn dim(&self) -> usize {
        self.ranges.len()
    }

    fn metric(&self) -> &M {
        &self.metric
    }

    fn union_columns(&mut self, data: &Dataset, begin: usize, count: usize) {

        for i in begin..begin + count {
            for (range, value) in self.ranges.iter_mut().zip(data.column(i)) {
                range.include(*value);
            }
        }

        self.min_width = self.ranges.iter().map(|r| r.width()).fold(f64::MAX, f64::min);
        if self.ranges.is_empty() {
            self.min_width = 0.0;
        }
    }

    fn contains(&self, point: &[f64]) -> bool {
        self.ranges.iter().zip(point).all(|(r, p)| r.lo <= *p && *p <= r.hi)
    }

    fn centroid(&self) -> Vec<f64> {
        self.ranges.iter().map(|r| r.mid()).collect()
    }

    fn diameter(&self) -> f64 {
        self.metric.accumulate(self.ranges.iter().map(|r| r.width()))
    }

    fn min_width(&self) -> f64 {
        self.min_width
    }

    fn min_distance(&self, other: &Self) -> f64 {

        if self.is_empty() || other.is_empty() {
            return f64::MAX;
        }

        let gaps = self.ranges.iter().zip(&other.ranges).map(|(a, b)| {
            (b.lo - a.hi).max(a.lo - b.hi).max(0.0)
        });

        self.metric.accumulate(gaps)
    }

    fn max_distance(&self, other: &Self) -> f64 {

        let gaps = self.ranges.iter().zip(&other.ranges).map(|(a, b)| {
            (b.hi - a.lo).abs().max((a.hi - b.lo).abs())
        });

        self.metric.accumulate(gaps)
    }

    fn min_distance_to_point(&self, point: &[f64]) -> f64 {

        if self.is_empty() {
            return f64::MAX;
        }

        let gaps = self.ranges.iter().zip(point).map(|(r, p)| (r.lo - p).max(p - r.hi).max(0.0));

        self.metric.accumulate(gaps)
    }

    fn max_distance_to_point(&self, point: &[f64]) -> f64 {

        let gaps = self.ranges.iter().zip(point).map(|(r, p)| (p - r.lo).abs().max((r.hi - p).abs()));

        self.metric.accumulate(gaps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn unit_square_at(x: f64, y: f64) -> HRectBound {

        let data = Dataset::from_columns(&[vec![x, y], vec![x + 1.0, y + 1.0]]).unwrap();
        let mut bound = HRectBound::empty(2);
        bound.union_columns(&data, 0, 2);
        bound
    }

    #[test]
    fn union_and_geometry() {

        let bound = unit_square_at(0.0, 0.0);

        assert_eq!(bound.centroid(), vec![0.5, 0.5]);
        assert_approx_eq!(bound.diameter(), 2.0f64.sqrt());
        assert_approx_eq!(bound.min_width(), 1.0);
        assert!(bound.contains(&[0.25, 1.0]));
        assert!(!bound.contains(&[1.25, 1.0]));
    }

    #[test]
    fn box_distances() {

        let a = unit_square_at(0.0, 0.0);
        let b = unit_square_at(4.0, 0.0);

        assert_approx_eq!(a.min_distance(&b), 3.0);
        assert_approx_eq!(a.max_distance(&b), (25.0f64 + 1.0).sqrt());
        assert_approx_eq!(a.min_distance(&a), 0.0);

        assert_approx_eq!(a.min_distance_to_point(&[0.5, 3.0]), 2.0);
        assert_approx_eq!(a.max_distance_to_point(&[0.0, 0.0]), 2.0f64.sqrt());
    }

    #[test]
    fn empty_bound_is_far_away() {

        let empty: HRectBound = HRectBound::empty(2);
        let a = unit_square_at(0.0, 0.0);

        assert_eq!(empty.min_distance(&a), f64::MAX);
        assert_approx_eq!(empty.diameter(), 0.0);
    }
}
