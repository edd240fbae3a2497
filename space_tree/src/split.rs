//! Split heuristics used while building a tree.
//!
//! A splitter looks at the columns of one node, decides whether they can be separated, and if so
//! reorders them in place so that the left child's points come first.

use crate::bound::Bound;
use crate::dataset::Dataset;

pub trait Splitter<B: Bound> {

    /// Partition columns `[begin, begin + count)` and return the first column of the right
    /// half, or `None` when the points cannot be separated (e.g. they are all identical).
    ///
    /// When given, `old_from_new` is indexed by absolute column and is kept in step with every
    /// swap made to `data`.
    fn split_node(
        &mut self,
        bound: &B,
        data: &mut Dataset,
        begin: usize,
        count: usize,
        old_from_new: Option<&mut [usize]>,
    ) -> Option<usize>;
}

/// Splits the widest dimension at the middle of its range.
#[derive(Debug, Clone, Copy, Default)]
pub struct MidpointSplit;

/// Splits the widest dimension at the mean of the points along it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanSplit;

impl<B: Bound> Splitter<B> for MidpointSplit {

    fn split_node(
        &mut self,
        _bound: &B,
        data: &mut Dataset,
        begin: usize,
        count: usize,
        old_from_new: Option<&mut [usize]>,
    ) -> Option<usize> {

        let (dim, lo, hi) = widest_dimension(data, begin, count)?;
        let split_value = separating_value(lo + (hi - lo) / 2.0, lo, hi);

        partition(data, begin, count, dim, split_value, old_from_new)
    }
}

impl<B: Bound> Splitter<B> for MeanSplit {

    fn split_node(
        &mut self,
        _bound: &B,
        data: &mut Dataset,
        begin: usize,
        count: usize,
        old_from_new: Option<&mut [usize]>,
    ) -> Option<usize> {

        let (dim, lo, hi) = widest_dimension(data, begin, count)?;
        let sum: f64 = (begin..begin + count).map(|i| data.column(i)[dim]).sum();
        let split_value = separating_value(sum / count as f64, lo, hi);

        partition(data, begin, count, dim, split_value, old_from_new)
    }
}

/// Dimension with the largest spread over the columns, or `None` if every dimension is flat.
fn widest_dimension(data: &Dataset, begin: usize, count: usize) -> Option<(usize, f64, f64)> {

    let mut best: Option<(usize, f64, f64)> = None;
    for (dim, (lo, hi)) in data.ranges(begin, count).into_iter().enumerate() {
        let width = hi - lo;
        let best_width = best.map(|(_, l, h)| h - l).unwrap_or(0.0);
        if width > best_width {
            best = Some((dim, lo, hi));
        }
    }

    best
}

/// `value` itself unless rounding pushed it down onto `lo`, in which case nothing would land
/// left of it and `hi` is used instead.
fn separating_value(value: f64, lo: f64, hi: f64) -> f64 {
    match value <= lo {
        true => hi,
        false => value,
    }
}

/// Moves every column whose value along `dim` is below `split_value` to the front of the range.
fn partition(
    data: &mut Dataset,
    begin: usize,
    count: usize,
    dim: usize,
    split_value: f64,
    mut old_from_new: Option<&mut [usize]>,
) -> Option<usize> {

    let end = begin + count;
    let mut split_col = begin;

    for i in begin..end {
        if data.column(i)[dim] < split_value {
            data.swap_columns(split_col, i);
            if let Some(map) = old_from_new.as_deref_mut() {
                map.swap(split_col, i);
            }
            split_col += 1;
        }
    }

    //a split that leaves one side empty is no split at all
    match split_col == begin || split_col == end {
        true => None,
        false => Some(split_col),
    }
}
