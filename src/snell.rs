//! Generalized Snell's law for complex refractive indices.
//!
//! Inside an absorbing layer the refraction angle is complex, so it is never
//! formed explicitly. Instead the layer is described by
//! `sin θ = (n_incident / n_layer) sin θ₀` and
//! `cos θ = sqrt(1 - sin²θ)` on the principal branch, which is all the
//! admittance and phase-thickness formulas need.

use num_complex::Complex64;

use crate::complex::ComplexExt;
use crate::error::MathError;


/// Complex sine of the propagation angle inside a layer of index `n_layer`.
pub fn sin_theta_in(
    n_incident: Complex64,
    n_layer: Complex64,
    sin_theta_0: f64,
) -> Result<Complex64, MathError> {
    Ok(n_incident.checked_div(n_layer)? * sin_theta_0)
}

/// Complex cosine of the propagation angle inside a layer of index `n_layer`,
/// for light arriving from `n_incident` at an angle whose sine is `sin_theta_0`.
///
/// # Example
/// ```rust
/// use num_complex::Complex64;
/// use thinfilm::snell::cos_theta_in;
///
/// let air = Complex64::new(1.0, 0.0);
/// let cos_t = cos_theta_in(air, air, 0.5).unwrap();
/// assert!((cos_t.re - 0.75_f64.sqrt()).abs() < 1e-12);
/// ```
pub fn cos_theta_in(
    n_incident: Complex64,
    n_layer: Complex64,
    sin_theta_0: f64,
) -> Result<Complex64, MathError> {
    let sin_t = sin_theta_in(n_incident, n_layer, sin_theta_0)?;
    Ok((Complex64::new(1.0, 0.0) - sin_t * sin_t).principal_sqrt())
}
