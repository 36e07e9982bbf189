//! Row-major sparse matrices
//!
//! [`CsrMatrix`] stores a [`SparsityPattern`] (row offsets plus sorted column
//! indices per row) and one value per pattern entry. Its [`Assemble`]
//! implementation merges the patterns of all operands before summing, so the
//! result is allocated exactly once and every input entry is visited once:
//!
//! 1. per row, the union of the operands' column sets is collected and sorted;
//! 2. a zero-filled value array is allocated for that union pattern;
//! 3. per row, each operand's entries are accumulated by a merge walk over the
//!    sorted column lists.
//!
//! Both row loops run on the rayon thread pool once the matrix has at least
//! [`AssemblyConfig::parallel_rows`] rows.

use super::{check_shape, Assemble, LinearContainer, Prune, Shape};
use crate::affine::AssemblyConfig;
use crate::error::{AffineError, Result};
use ndarray::Array2;
use rayon::prelude::*;
use tracing::trace;

/// Positions of the stored entries of a row-major sparse matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparsityPattern {
    nrows: usize,
    ncols: usize,
    /// `nrows + 1` offsets into `col_indices`
    row_offsets: Vec<usize>,
    /// Strictly increasing within each row
    col_indices: Vec<usize>,
}

impl SparsityPattern {
    /// Create a pattern from compressed-row data.
    ///
    /// # Errors
    ///
    /// * `InvalidSparseStructure` if the offsets are not `nrows + 1` non-decreasing
    ///   values starting at 0 and ending at `col_indices.len()`, or if the columns
    ///   of a row are not strictly increasing
    /// * `EntryOutOfBounds` for a column index `>= ncols`
    pub fn new(
        nrows: usize,
        ncols: usize,
        row_offsets: Vec<usize>,
        col_indices: Vec<usize>,
    ) -> Result<Self> {
        if row_offsets.len() != nrows + 1 {
            return Err(AffineError::InvalidSparseStructure(
                "row offsets must have one entry per row plus one",
            ));
        }
        if row_offsets[0] != 0 || row_offsets[nrows] != col_indices.len() {
            return Err(AffineError::InvalidSparseStructure(
                "row offsets must start at 0 and end at the number of entries",
            ));
        }
        for row in 0..nrows {
            let (start, end) = (row_offsets[row], row_offsets[row + 1]);
            if start > end || end > col_indices.len() {
                return Err(AffineError::InvalidSparseStructure(
                    "row offsets must be non-decreasing",
                ));
            }
            let cols = &col_indices[start..end];
            if cols.windows(2).any(|w| w[0] >= w[1]) {
                return Err(AffineError::InvalidSparseStructure(
                    "column indices must be strictly increasing within a row",
                ));
            }
            if let Some(&col) = cols.last().filter(|&&col| col >= ncols) {
                return Err(AffineError::EntryOutOfBounds {
                    row,
                    col,
                    nrows,
                    ncols,
                });
            }
        }
        Ok(Self {
            nrows,
            ncols,
            row_offsets,
            col_indices,
        })
    }

    /// Pattern with no entries.
    pub fn empty(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            row_offsets: vec![0; nrows + 1],
            col_indices: Vec::new(),
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.col_indices.len()
    }

    /// Sorted column indices of row `row`.
    ///
    /// # Panics
    ///
    /// If `row >= self.nrows()`.
    pub fn row(&self, row: usize) -> &[usize] {
        &self.col_indices[self.row_offsets[row]..self.row_offsets[row + 1]]
    }

    pub fn row_offsets(&self) -> &[usize] {
        &self.row_offsets
    }

    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    /// Position of `(row, col)` in the entry arrays, if stored.
    fn position(&self, row: usize, col: usize) -> Option<usize> {
        self.row(row)
            .binary_search(&col)
            .ok()
            .map(|k| self.row_offsets[row] + k)
    }

    /// Union of several patterns of equal dimensions.
    ///
    /// # Errors
    ///
    /// * `RequirementsNotMet` for an empty list
    /// * `ShapeMismatch` if the patterns disagree in dimensions
    pub fn union(patterns: &[&SparsityPattern]) -> Result<Self> {
        let (first, rest) = patterns.split_first().ok_or(AffineError::RequirementsNotMet {
            reason: "cannot form the union of no patterns",
        })?;
        for pattern in rest {
            if (pattern.nrows, pattern.ncols) != (first.nrows, first.ncols) {
                return Err(AffineError::ShapeMismatch {
                    expected: first.shape(),
                    actual: pattern.shape(),
                });
            }
        }
        Ok(Self::union_unchecked(patterns, false))
    }

    /// Union of non-empty, equally sized patterns, optionally row-parallel.
    fn union_unchecked(patterns: &[&SparsityPattern], parallel: bool) -> Self {
        let (nrows, ncols) = (patterns[0].nrows, patterns[0].ncols);

        let merge_row = |row: usize| -> Vec<usize> {
            let mut cols: Vec<usize> = patterns
                .iter()
                .flat_map(|pattern| pattern.row(row).iter().copied())
                .collect();
            cols.sort_unstable();
            cols.dedup();
            cols
        };
        let rows: Vec<Vec<usize>> = if parallel {
            (0..nrows).into_par_iter().map(merge_row).collect()
        } else {
            (0..nrows).map(merge_row).collect()
        };

        let mut row_offsets = Vec::with_capacity(nrows + 1);
        row_offsets.push(0);
        let mut col_indices = Vec::with_capacity(rows.iter().map(Vec::len).sum());
        for cols in rows {
            col_indices.extend(cols);
            row_offsets.push(col_indices.len());
        }
        Self {
            nrows,
            ncols,
            row_offsets,
            col_indices,
        }
    }

    fn shape(&self) -> Shape {
        Shape::Matrix {
            rows: self.nrows,
            cols: self.ncols,
        }
    }
}

/// A row-major (CSR) sparse matrix of `f64`
///
/// # Examples
///
/// ```
/// use affine_decomp::la::{CsrMatrix, LinearContainer};
///
/// let a = CsrMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (1, 1, 2.0)]).unwrap();
/// let b = CsrMatrix::from_triplets(2, 2, &[(0, 1, 3.0), (1, 1, 1.0)]).unwrap();
///
/// let mut c = a.copy();
/// c.axpy(2.0, &b).unwrap();
/// assert_eq!(c.nnz(), 3);
/// assert_eq!(c.get(0, 1), Some(6.0));
/// assert_eq!(c.get(1, 1), Some(4.0));
/// assert_eq!(c.get(1, 0), Some(0.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    pattern: SparsityPattern,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Create a matrix from validated compressed-row data.
    ///
    /// # Errors
    ///
    /// * Everything [`SparsityPattern::new`] rejects
    /// * `LengthMismatch` if `values` does not have one entry per column index
    pub fn try_from_csr_data(
        nrows: usize,
        ncols: usize,
        row_offsets: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let pattern = SparsityPattern::new(nrows, ncols, row_offsets, col_indices)?;
        Self::try_from_pattern_and_values(pattern, values)
    }

    /// Create a matrix with a given pattern.
    pub fn try_from_pattern_and_values(pattern: SparsityPattern, values: Vec<f64>) -> Result<Self> {
        if values.len() != pattern.nnz() {
            return Err(AffineError::LengthMismatch {
                expected: pattern.nnz(),
                actual: values.len(),
            });
        }
        Ok(Self { pattern, values })
    }

    /// Create a matrix from `(row, col, value)` triplets in any order.
    ///
    /// Duplicate positions are summed. Explicit zeros are kept in the pattern.
    pub fn from_triplets(nrows: usize, ncols: usize, triplets: &[(usize, usize, f64)]) -> Result<Self> {
        let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); nrows];
        for &(row, col, value) in triplets {
            if row >= nrows || col >= ncols {
                return Err(AffineError::EntryOutOfBounds {
                    row,
                    col,
                    nrows,
                    ncols,
                });
            }
            rows[row].push((col, value));
        }

        let mut row_offsets = Vec::with_capacity(nrows + 1);
        row_offsets.push(0);
        let mut col_indices = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());
        for mut entries in rows {
            entries.sort_by_key(|&(col, _)| col);
            let row_start = col_indices.len();
            for (col, value) in entries {
                if col_indices.len() > row_start && col_indices.last() == Some(&col) {
                    if let Some(last) = values.last_mut() {
                        *last += value;
                    }
                } else {
                    col_indices.push(col);
                    values.push(value);
                }
            }
            row_offsets.push(col_indices.len());
        }

        Ok(Self {
            pattern: SparsityPattern {
                nrows,
                ncols,
                row_offsets,
                col_indices,
            },
            values,
        })
    }

    /// Sparse copy of a dense matrix, storing only the non-zero entries.
    pub fn from_dense(dense: &Array2<f64>) -> Self {
        let (nrows, ncols) = dense.dim();
        let mut row_offsets = Vec::with_capacity(nrows + 1);
        row_offsets.push(0);
        let mut col_indices = Vec::new();
        let mut values = Vec::new();
        for row in dense.rows() {
            for (col, &value) in row.iter().enumerate() {
                if value != 0.0 {
                    col_indices.push(col);
                    values.push(value);
                }
            }
            row_offsets.push(col_indices.len());
        }
        Self {
            pattern: SparsityPattern {
                nrows,
                ncols,
                row_offsets,
                col_indices,
            },
            values,
        }
    }

    /// `n x n` identity.
    pub fn identity(n: usize) -> Self {
        Self {
            pattern: SparsityPattern {
                nrows: n,
                ncols: n,
                row_offsets: (0..=n).collect(),
                col_indices: (0..n).collect(),
            },
            values: vec![1.0; n],
        }
    }

    /// Matrix without stored entries.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            pattern: SparsityPattern::empty(nrows, ncols),
            values: Vec::new(),
        }
    }

    pub fn nrows(&self) -> usize {
        self.pattern.nrows
    }

    pub fn ncols(&self) -> usize {
        self.pattern.ncols
    }

    /// Number of stored entries, explicit zeros included.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn pattern(&self) -> &SparsityPattern {
        &self.pattern
    }

    /// Stored values in pattern order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Column indices and values of row `row`.
    ///
    /// # Panics
    ///
    /// If `row >= self.nrows()`.
    pub fn row(&self, row: usize) -> (&[usize], &[f64]) {
        let range = self.pattern.row_offsets[row]..self.pattern.row_offsets[row + 1];
        (&self.pattern.col_indices[range.clone()], &self.values[range])
    }

    /// Value at `(row, col)`: `None` outside the matrix, `Some(0.0)` for an
    /// entry that is not stored.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.nrows() || col >= self.ncols() {
            return None;
        }
        Some(
            self.pattern
                .position(row, col)
                .map_or(0.0, |k| self.values[k]),
        )
    }

    /// Iterate over the stored `(row, col, value)` entries in row-major order.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.nrows()).flat_map(move |row| {
            let (cols, values) = self.row(row);
            cols.iter()
                .zip(values.iter())
                .map(move |(&col, &value)| (row, col, value))
        })
    }

    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros((self.nrows(), self.ncols()));
        for (row, col, value) in self.triplets() {
            dense[[row, col]] = value;
        }
        dense
    }

    /// `Σ w_i · A_i` over the union of the operands' patterns.
    ///
    /// The operands must be non-empty and of equal dimensions.
    fn assemble_union(operands: &[(&CsrMatrix, f64)], parallel: bool) -> Self {
        let patterns: Vec<&SparsityPattern> = operands.iter().map(|(m, _)| &m.pattern).collect();
        let pattern = SparsityPattern::union_unchecked(&patterns, parallel);
        let mut values = vec![0.0; pattern.nnz()];

        // One mutable slice per result row
        let mut rows: Vec<&mut [f64]> = Vec::with_capacity(pattern.nrows);
        let mut rest = values.as_mut_slice();
        for row in 0..pattern.nrows {
            let len = pattern.row_offsets[row + 1] - pattern.row_offsets[row];
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(len);
            rows.push(head);
            rest = tail;
        }

        let accumulate = |(row, out): (usize, &mut &mut [f64])| {
            let union_cols = pattern.row(row);
            for &(matrix, weight) in operands {
                let (cols, vals) = matrix.row(row);
                // cols is a sorted subset of union_cols
                let mut k = 0;
                for (col, value) in cols.iter().zip(vals) {
                    while union_cols[k] < *col {
                        k += 1;
                    }
                    out[k] += weight * value;
                }
            }
        };
        if parallel {
            rows.par_iter_mut().enumerate().for_each(accumulate);
        } else {
            rows.iter_mut().enumerate().for_each(accumulate);
        }

        trace!(
            rows = pattern.nrows,
            nnz = pattern.nnz(),
            operands = operands.len(),
            parallel,
            "assembled sparse matrix over pattern union"
        );
        Self { pattern, values }
    }
}

impl LinearContainer for CsrMatrix {
    fn copy(&self) -> Self {
        self.clone()
    }

    fn shape(&self) -> Shape {
        self.pattern.shape()
    }

    fn scal(&mut self, alpha: f64) {
        for value in &mut self.values {
            *value *= alpha;
        }
    }

    /// Adds in place when both patterns agree, otherwise grows `self` to the union.
    fn axpy(&mut self, alpha: f64, x: &Self) -> Result<()> {
        check_shape(&*self, x)?;
        if self.pattern == x.pattern {
            for (a, b) in self.values.iter_mut().zip(&x.values) {
                *a += alpha * b;
            }
        } else {
            let merged = Self::assemble_union(&[(&*self, 1.0), (x, alpha)], false);
            *self = merged;
        }
        Ok(())
    }

    fn dot(&self, other: &Self) -> Result<f64> {
        check_shape(self, other)?;
        let mut sum = 0.0;
        for row in 0..self.nrows() {
            let (a_cols, a_vals) = self.row(row);
            let (b_cols, b_vals) = other.row(row);
            let (mut i, mut j) = (0, 0);
            while i < a_cols.len() && j < b_cols.len() {
                match a_cols[i].cmp(&b_cols[j]) {
                    std::cmp::Ordering::Less => i += 1,
                    std::cmp::Ordering::Greater => j += 1,
                    std::cmp::Ordering::Equal => {
                        sum += a_vals[i] * b_vals[j];
                        i += 1;
                        j += 1;
                    }
                }
            }
        }
        Ok(sum)
    }
}

impl Assemble for CsrMatrix {
    fn assemble(operands: &[(&Self, f64)], config: &AssemblyConfig) -> Result<Self> {
        let ((first, _), rest) = operands.split_first().ok_or(AffineError::RequirementsNotMet {
            reason: "cannot assemble an empty list of operands",
        })?;
        for (operand, _) in rest {
            check_shape(*first, *operand)?;
        }
        Ok(Self::assemble_union(
            operands,
            config.parallel_for(first.nrows()),
        ))
    }
}

impl Prune for CsrMatrix {
    fn pruned(&self, tolerance: f64) -> Self {
        let mut row_offsets = Vec::with_capacity(self.nrows() + 1);
        row_offsets.push(0);
        let mut col_indices = Vec::with_capacity(self.nnz());
        let mut values = Vec::with_capacity(self.nnz());
        for row in 0..self.nrows() {
            let (cols, vals) = self.row(row);
            for (&col, &value) in cols.iter().zip(vals) {
                if value.abs() > tolerance {
                    col_indices.push(col);
                    values.push(value);
                }
            }
            row_offsets.push(col_indices.len());
        }
        Self {
            pattern: SparsityPattern {
                nrows: self.nrows(),
                ncols: self.ncols(),
                row_offsets,
                col_indices,
            },
            values,
        }
    }
}
