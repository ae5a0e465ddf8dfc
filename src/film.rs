//! The film layer and its characteristic matrix.
//!
//! A single film of index `n₁` and physical thickness `d` sits between a
//! semi-infinite incident medium and a semi-infinite substrate. Its effect
//! on the tangential fields is the 2x2 characteristic matrix
//!
//! ```text
//! M = [ cos δ          i sin δ / η₁ ]
//!     [ i η₁ sin δ     cos δ        ]
//! ```
//!
//! where `δ = 2π n₁ d cos θ₁ / λ` is the phase thickness and `η₁` the
//! film admittance. Applying `M` to `[1, ηₛ]` gives the boundary
//! parameters `B` and `C` from which reflectance and transmittance follow.

use std::f64::consts::PI;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::complex::ComplexExt;
use crate::error::MathError;
use crate::matrix::ComplexMatrix;


/// Refractive indices and thickness of the incident medium / film / substrate stack.
///
/// Indices follow the `N = n - ik` convention, so an absorbing film has a
/// negative imaginary part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilmStack {
    pub incident: Complex64,
    pub film: Complex64,
    /// Physical film thickness in nanometres.
    pub thickness: f64,
    pub substrate: Complex64,
}

impl FilmStack {
    pub fn new(incident: Complex64, film: Complex64, thickness: f64, substrate: Complex64) -> Self {
        Self {
            incident,
            film,
            thickness,
            substrate,
        }
    }

    /// True when neither the film nor the substrate absorbs.
    pub fn is_lossless(&self) -> bool {
        self.film.im == 0.0 && self.substrate.im == 0.0
    }
}

/// The `B` and `C` boundary parameters, `[B, C]ᵀ = M [1, ηₛ]ᵀ`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundaryParameters {
    pub b: Complex64,
    pub c: Complex64,
}

/// Phase thickness `δ = (2π d / λ) n cos θ` of a layer.
pub fn phase_thickness(
    thickness: f64,
    wavelength: f64,
    n_film: Complex64,
    cos_theta: Complex64,
) -> Complex64 {
    Complex64::new(2.0 * PI * thickness / wavelength, 0.0) * n_film * cos_theta
}

/// Characteristic matrix of a layer with phase thickness `delta` and admittance `eta`.
pub fn characteristic_matrix(delta: Complex64, eta: Complex64) -> Result<ComplexMatrix, MathError> {
    let i = Complex64::i();
    let cos_d = delta.cos();
    let sin_d = delta.sin();
    Ok(ComplexMatrix::from_array([
        [cos_d, (i * sin_d).checked_div(eta)?],
        [i * eta * sin_d, cos_d],
    ]))
}

/// Applies the characteristic matrix to the substrate admittance.
pub fn boundary_parameters(
    m: &ComplexMatrix,
    eta_substrate: Complex64,
) -> Result<BoundaryParameters, MathError> {
    let substrate = ComplexMatrix::from_array([[Complex64::new(1.0, 0.0)], [eta_substrate]]);
    let bc = m.checked_mul(&substrate)?;
    Ok(BoundaryParameters {
        b: bc[(0, 0)],
        c: bc[(1, 0)],
    })
}
