//! Error kinds raised by the numeric core.

use thiserror::Error;

/// Errors that can occur in complex arithmetic, matrix algebra or an optics calculation.
///
/// None of these are recovered inside the crate; they end the calculation
/// that raised them and are handed back to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MathError {
    #[error("Division by zero: denominator magnitude squared is {0:.3e}")]
    DivisionByZero(f64),

    #[error("Dimension mismatch in {op}: {left:?} and {right:?}")]
    DimensionMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("{op} is only implemented for 2x2 matrices, got {rows}x{cols}")]
    UnsupportedOperation {
        op: &'static str,
        rows: usize,
        cols: usize,
    },

    #[error("Matrix is singular (|det|^2 = {0:.3e}) and cannot be inverted")]
    SingularMatrix(f64),
}
