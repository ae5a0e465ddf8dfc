//! Small dense matrices of complex numbers.
//!
//! [`ComplexMatrix`] wraps an `nalgebra` dynamic matrix and checks operand
//! shapes before every arithmetic operation, returning a
//! [`MathError::DimensionMismatch`] rather than panicking. The determinant
//! and inverse are specialised to the 2x2 characteristic matrices used by
//! the optics engine.

use std::ops::{Index, IndexMut};

use itertools::Itertools;
use nalgebra::DMatrix;
use num_complex::Complex64;
use serde::{Serialize, Serializer};

use crate::complex::{format_complex, ComplexExt};
use crate::config::{COMPLEX_PRECISION, DIVISION_EPSILON, MATRIX_MIN_COLUMN_WIDTH};
use crate::error::MathError;


/// A rows x columns grid of complex numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexMatrix {
    data: DMatrix<Complex64>,
}

impl ComplexMatrix {
    /// All-zero matrix of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: DMatrix::zeros(rows, cols),
        }
    }

    /// Square identity matrix.
    pub fn identity(size: usize) -> Self {
        Self {
            data: DMatrix::identity(size, size),
        }
    }

    /// Builds a matrix from explicit rows. All rows must have the same length.
    pub fn from_rows(rows: &[Vec<Complex64>]) -> Result<Self, MathError> {
        let cols = rows.first().map_or(0, |row| row.len());
        if let Some(bad) = rows.iter().find(|row| row.len() != cols) {
            return Err(MathError::DimensionMismatch {
                op: "construction",
                left: (1, cols),
                right: (1, bad.len()),
            });
        }
        Ok(Self {
            data: DMatrix::from_fn(rows.len(), cols, |i, j| rows[i][j]),
        })
    }

    /// Builds a matrix from a fixed-size grid, which cannot be ragged.
    pub fn from_array<const R: usize, const C: usize>(grid: [[Complex64; C]; R]) -> Self {
        Self {
            data: DMatrix::from_fn(R, C, |i, j| grid[i][j]),
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    /// Matrix product `self * rhs`. Requires `self.cols() == rhs.rows()`.
    pub fn checked_mul(&self, rhs: &Self) -> Result<Self, MathError> {
        if self.cols() != rhs.rows() {
            return Err(self.mismatch("multiplication", rhs));
        }
        Ok(Self {
            data: &self.data * &rhs.data,
        })
    }

    /// Element-wise sum. Requires identical shapes.
    pub fn checked_add(&self, rhs: &Self) -> Result<Self, MathError> {
        if self.shape() != rhs.shape() {
            return Err(self.mismatch("addition", rhs));
        }
        Ok(Self {
            data: &self.data + &rhs.data,
        })
    }

    /// Element-wise difference. Requires identical shapes.
    pub fn checked_sub(&self, rhs: &Self) -> Result<Self, MathError> {
        if self.shape() != rhs.shape() {
            return Err(self.mismatch("subtraction", rhs));
        }
        Ok(Self {
            data: &self.data - &rhs.data,
        })
    }

    pub fn transpose(&self) -> Self {
        Self {
            data: self.data.transpose(),
        }
    }

    /// `ad - bc` of a 2x2 matrix.
    pub fn determinant(&self) -> Result<Complex64, MathError> {
        self.require_2x2("determinant")?;
        let d = &self.data;
        Ok(d[(0, 0)] * d[(1, 1)] - d[(0, 1)] * d[(1, 0)])
    }

    /// Inverse of a 2x2 matrix, `[[d, -b], [-c, a]] / det`.
    pub fn inverse(&self) -> Result<Self, MathError> {
        self.require_2x2("inverse")?;
        let det = self.determinant()?;
        if det.abs_squared() < DIVISION_EPSILON {
            return Err(MathError::SingularMatrix(det.abs_squared()));
        }
        let d = &self.data;
        Ok(Self::from_array([
            [d[(1, 1)].checked_div(det)?, -d[(0, 1)].checked_div(det)?],
            [-d[(1, 0)].checked_div(det)?, d[(0, 0)].checked_div(det)?],
        ]))
    }

    pub fn to_rows(&self) -> Vec<Vec<Complex64>> {
        self.data
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }

    /// Renders the matrix as bracketed, right-aligned rows for the text log.
    ///
    /// Each column is as wide as its widest cell, and never narrower than
    /// [`MATRIX_MIN_COLUMN_WIDTH`]. Cells are separated by two spaces and
    /// every row ends with a newline.
    pub fn format_table(&self) -> String {
        let cells: Vec<Vec<String>> = self
            .to_rows()
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|z| format_complex(z, COMPLEX_PRECISION))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = (0..self.cols())
            .map(|j| {
                cells
                    .iter()
                    .map(|row| row[j].chars().count())
                    .max()
                    .unwrap_or(0)
                    .max(MATRIX_MIN_COLUMN_WIDTH)
            })
            .collect();

        cells
            .iter()
            .map(|row| {
                let body = row
                    .iter()
                    .zip(&widths)
                    .map(|(cell, width)| format!("{:>width$}", cell, width = width))
                    .join("  ");
                format!("[ {} ]\n", body)
            })
            .collect()
    }

    fn require_2x2(&self, op: &'static str) -> Result<(), MathError> {
        if self.shape() != (2, 2) {
            return Err(MathError::UnsupportedOperation {
                op,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok(())
    }

    fn mismatch(&self, op: &'static str, rhs: &Self) -> MathError {
        MathError::DimensionMismatch {
            op,
            left: self.shape(),
            right: rhs.shape(),
        }
    }
}

impl Index<(usize, usize)> for ComplexMatrix {
    type Output = Complex64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<(usize, usize)> for ComplexMatrix {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl Serialize for ComplexMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_rows().serialize(serializer)
    }
}
