//! Dense square matrices.
//!
//! QAP instances and relaxed solutions are small, dense `n×n` matrices.
//! [`SquareMatrix`] wraps an [`ndarray::Array2`] kept in standard (row-major)
//! layout, so element iteration order is always row by row.

use crate::error::{QapError, QapResult};
use ndarray::{Array2, ArrayView1, ArrayViewMut1, Axis};
use std::ops::{Index, IndexMut};

/// Dense row-major `n×n` matrix of `f64`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SquareMatrix {
    data: Array2<f64>,
}

impl SquareMatrix {
    /// All-zero matrix.
    pub fn zeros(n: usize) -> Self {
        Self {
            data: Array2::zeros((n, n)),
        }
    }

    /// Matrix with every entry equal to `value`.
    pub fn filled(n: usize, value: f64) -> Self {
        Self {
            data: Array2::from_elem((n, n), value),
        }
    }

    /// Identity matrix.
    pub fn identity(n: usize) -> Self {
        Self {
            data: Array2::eye(n),
        }
    }

    /// Builds a matrix from row vectors.
    ///
    /// Fails with [`QapError::InvalidProblem`] if any row length differs
    /// from the number of rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> QapResult<Self> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(QapError::InvalidProblem(format!(
                    "row {i} has {} entries, expected {n} (matrix must be square)",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Self::from_vec(n, data)
    }

    /// Wraps a row-major buffer of length `n*n`.
    pub fn from_vec(n: usize, data: Vec<f64>) -> QapResult<Self> {
        let found = data.len();
        let mismatch = || QapError::DimensionMismatch {
            expected: n.saturating_mul(n),
            found,
        };
        if n.checked_mul(n) != Some(found) {
            return Err(mismatch());
        }
        let data = Array2::from_shape_vec((n, n), data).map_err(|_| mismatch())?;
        Ok(Self { data })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[[i, j]]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[[i, j]] = value;
    }

    #[inline]
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.data.row(i)
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> ArrayViewMut1<'_, f64> {
        self.data.row_mut(i)
    }

    /// Entries in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &f64> + '_ {
        self.data.iter()
    }

    /// Mutable entries in row-major order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut f64> + '_ {
        self.data.iter_mut()
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn row_sums(&self) -> Vec<f64> {
        self.data.sum_axis(Axis(1)).to_vec()
    }

    pub fn col_sums(&self) -> Vec<f64> {
        self.data.sum_axis(Axis(0)).to_vec()
    }

    pub fn transpose(&self) -> Self {
        Self {
            data: self.data.t().as_standard_layout().into_owned(),
        }
    }

    /// Matrix product `self · other`.
    pub fn matmul(&self, other: &SquareMatrix) -> Self {
        debug_assert_eq!(self.size(), other.size());
        Self {
            data: self.data.dot(&other.data),
        }
    }

    /// Frobenius inner product `Σ self[i][j]·other[i][j]`.
    pub fn dot(&self, other: &SquareMatrix) -> f64 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// `self += alpha · other`.
    pub fn add_scaled(&mut self, alpha: f64, other: &SquareMatrix) {
        self.data.scaled_add(alpha, &other.data);
    }

    pub fn scale(&mut self, alpha: f64) {
        self.data.mapv_inplace(|v| v * alpha);
    }

    /// Applies `f` to every entry.
    pub fn map_inplace<F: FnMut(f64) -> f64>(&mut self, f: F) {
        self.data.mapv_inplace(f);
    }

    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0f64, |m, v| m.max(v.abs()))
    }

    pub fn frobenius_norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    pub fn min_value(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Largest absolute entry-wise difference.
    pub fn max_abs_diff(&self, other: &SquareMatrix) -> f64 {
        self.data
            .iter()
            .zip(other.data.iter())
            .fold(0.0f64, |m, (a, b)| m.max((a - b).abs()))
    }
}

impl Index<(usize, usize)> for SquareMatrix {
    type Output = f64;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[[i, j]]
    }
}

impl IndexMut<(usize, usize)> for SquareMatrix {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[[i, j]]
    }
}
