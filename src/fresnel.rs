//! Fresnel equations for a single interface.
//!
//! These are the amplitude coefficients of a bare boundary between two
//! media. A film of zero thickness has an identity characteristic matrix,
//! so the film engine must reduce to exactly these values; they are kept
//! here as an independent check on it.
//!
//! Angles enter through their (possibly complex) cosines so that absorbing
//! media are handled the same way as in [`crate::snell`].

use num_complex::Complex64;

use crate::complex::ComplexExt;
use crate::error::MathError;


/// Amplitude coefficients for the two linear polarizations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpPair {
    pub s: Complex64,
    pub p: Complex64,
}

/// Fresnel reflection coefficients from medium `n1` into medium `n2`.
///
/// `cos_i` and `cos_t` are the cosines of the incidence and refraction
/// angles. The p coefficient uses the convention
/// `r_p = (n2 cos_i - n1 cos_t) / (n2 cos_i + n1 cos_t)`.
pub fn refl(
    n1: Complex64,
    n2: Complex64,
    cos_i: Complex64,
    cos_t: Complex64,
) -> Result<SpPair, MathError> {
    let s = (n1 * cos_i - n2 * cos_t).checked_div(n1 * cos_i + n2 * cos_t)?;
    let p = (n2 * cos_i - n1 * cos_t).checked_div(n2 * cos_i + n1 * cos_t)?;
    Ok(SpPair { s, p })
}

/// Fresnel transmission coefficients from medium `n1` into medium `n2`.
pub fn refr(
    n1: Complex64,
    n2: Complex64,
    cos_i: Complex64,
    cos_t: Complex64,
) -> Result<SpPair, MathError> {
    let s = (2.0 * n1 * cos_i).checked_div(n1 * cos_i + n2 * cos_t)?;
    let p = (2.0 * n1 * cos_i).checked_div(n2 * cos_i + n1 * cos_t)?;
    Ok(SpPair { s, p })
}
