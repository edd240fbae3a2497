//! Column-major point storage shared by every node of a tree.
//!
//! Columns are addressed by their absolute index. A dataset cut out of a larger one with
//! [`Dataset::columns`] remembers where it started, so a subtree shipped to another process keeps
//! the point indices of the tree it came from.

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    dim: usize,
    first_column: usize,
    values: Vec<f64>,
}

/// One point of a dataset together with its absolute column index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<'a> {
    pub index: usize,
    pub coords: &'a [f64],
}

impl Dataset {

    /// `values` holds `dim` consecutive values per column.
    pub fn new(dim: usize, values: Vec<f64>) -> Result<Self, Error> {

        if dim == 0 {
            return Err(Error::InvalidArgument("dataset dimension must be at least 1".to_string()));
        }

        if values.len() % dim != 0 {
            return Err(Error::InvalidArgument(format!(
                "{} values do not fill columns of dimension {}",
                values.len(),
                dim
            )));
        }

        Ok(Self {
            dim,
            first_column: 0,
            values,
        })
    }

    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self, Error> {

        let dim = match columns.first() {
            None => return Err(Error::InvalidArgument("no columns given".to_string())),
            Some(x) => x.len(),
        };

        let mut values: Vec<f64> = Vec::with_capacity(dim * columns.len());
        for (i, column) in columns.iter().enumerate() {
            if column.len() != dim {
                return Err(Error::InvalidArgument(format!(
                    "column {} has dimension {}, expected {}",
                    i,
                    column.len(),
                    dim
                )));
            }
            values.extend_from_slice(column);
        }

        Self::new(dim, values)
    }

    /// Uniform random points in the unit cube.
    pub fn random(dim: usize, n_cols: usize) -> Result<Self, Error> {

        let values: Vec<f64> = (0..dim * n_cols).map(|_| rand::random::<f64>()).collect();

        Self::new(dim, values)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn n_cols(&self) -> usize {
        self.values.len() / self.dim
    }

    /// Absolute index of the first stored column.
    pub fn first_column(&self) -> usize {
        self.first_column
    }

    /// One past the absolute index of the last stored column.
    pub fn end_column(&self) -> usize {
        self.first_column + self.n_cols()
    }

    pub fn holds(&self, begin: usize, count: usize) -> bool {
        begin
            .checked_add(count)
            .map_or(false, |end| begin >= self.first_column && end <= self.end_column())
    }

    /// Panics if `index` is not stored here.
    pub fn column(&self, index: usize) -> &[f64] {

        let local = index - self.first_column;
        &self.values[local * self.dim..(local + 1) * self.dim]
    }

    pub fn point(&self, index: usize) -> Point<'_> {
        Point {
            index,
            coords: self.column(index),
        }
    }

    pub fn swap_columns(&mut self, a: usize, b: usize) {

        if a == b {
            return;
        }

        let a = a - self.first_column;
        let b = b - self.first_column;
        for row in 0..self.dim {
            self.values.swap(a * self.dim + row, b * self.dim + row);
        }
    }

    /// Copy of columns `[begin, begin + count)` that keeps their absolute indices.
    pub fn columns(&self, begin: usize, count: usize) -> Result<Self, Error> {

        if !self.holds(begin, count) {
            return Err(Error::InvalidArgument(format!(
                "columns [{}, {} more) are not inside [{}, {})",
                begin,
                count,
                self.first_column,
                self.end_column()
            )));
        }

        let start = (begin - self.first_column) * self.dim;
        let values = self.values[start..start + count * self.dim].to_vec();

        Ok(Self {
            dim: self.dim,
            first_column: begin,
            values,
        })
    }

    /// The same columns, renumbered from zero.
    pub fn rebased(&self) -> Self {

        let mut copy = self.clone();
        copy.first_column = 0;
        copy
    }

    /// Per-dimension `(min, max)` over columns `[begin, begin + count)`.
    pub fn ranges(&self, begin: usize, count: usize) -> Vec<(f64, f64)> {

        let mut ranges = vec![(f64::MAX, f64::MIN); self.dim];
        for i in begin..begin + count {
            for (range, value) in ranges.iter_mut().zip(self.column(i)) {
                if *value < range.0 {
                    range.0 = *value;
                }
                if *value > range.1 {
                    range.1 = *value;
                }
            }
        }

        ranges
    }
}
