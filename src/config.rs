//! Numeric tolerances and display constants shared across the crate.

/// Squared magnitude below which a complex or real denominator is treated as zero.
pub const DIVISION_EPSILON: f64 = 1e-15;
/// Incidence angles (radians) with magnitude below this are treated as normal incidence.
pub const NORMAL_INCIDENCE_EPSILON: f64 = 1e-10;
/// Imaginary parts with magnitude below this are displayed as purely real.
pub const DISPLAY_IMAG_EPSILON: f64 = 1e-10;
/// Maximum allowed |R + T + A - 1| for a result to count as energy conserving.
pub const ENERGY_TOLERANCE: f64 = 1e-6;
/// Width of the left-aligned label column in the text log.
pub const LABEL_WIDTH: usize = 25;
/// Minimum width of a formatted matrix column.
pub const MATRIX_MIN_COLUMN_WIDTH: usize = 12;
/// Decimal places for real scalars in the text log.
pub const SCALAR_PRECISION: usize = 6;
/// Decimal places for complex values and matrix cells in the text log.
pub const COMPLEX_PRECISION: usize = 4;
/// Maximum error, in percentage points, for a reference case to pass.
pub const VALIDATION_TOLERANCE: f64 = 0.01;
/// Maximum error for the complex function identities checked before the reference cases.
pub const IDENTITY_TOLERANCE: f64 = 1e-12;
