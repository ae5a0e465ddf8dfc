//! Tilted optical admittances.
//!
//! At oblique incidence each medium is described by an effective index
//! that depends on polarization: `η = n cos θ` for S and `η = n / cos θ`
//! for P, with `cos θ` taken from complex Snell's law in every medium but
//! the incident one. At normal incidence the admittances are the indices
//! themselves.

use num_complex::Complex64;
use serde::Serialize;

use crate::complex::ComplexExt;
use crate::config::NORMAL_INCIDENCE_EPSILON;
use crate::error::MathError;
use crate::film::FilmStack;
use crate::result::Polarization;
use crate::snell;

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> FilmStack {
        FilmStack::new(
            Complex64::new(1.0, 0.0),
            Complex64::new(2.385, -0.1),
            99.45,
            Complex64::new(1.52, 0.0),
        )
    }

    #[test]
    fn normal_incidence_uses_indices() {
        let eta = Admittances::compute(&stack(), 0.0, Polarization::P).unwrap();
        assert_eq!(eta.incident, Complex64::new(1.0, 0.0));
        assert_eq!(eta.film, Complex64::new(2.385, -0.1));
        assert_eq!(eta.substrate, Complex64::new(1.52, 0.0));
        assert_eq!(eta.cos_film, Complex64::new(1.0, 0.0));
        assert!(is_normal_incidence(1e-11));
        assert!(!is_normal_incidence(1e-9));
    }

    #[test]
    fn s_and_p_are_reciprocal_in_cosine() {
        let angle = 0.6;
        let s = Admittances::compute(&stack(), angle, Polarization::S).unwrap();
        let p = Admittances::compute(&stack(), angle, Polarization::P).unwrap();
        // η_s η_p = n²
        let n = stack().film;
        assert!((s.film * p.film - n * n).norm() < 1e-12);
        assert!((s.incident - Complex64::new(angle.cos(), 0.0)).norm() < 1e-12);
        assert!((p.incident - Complex64::new(1.0 / angle.cos(), 0.0)).norm() < 1e-12);
        assert_eq!(s.cos_film, p.cos_film);
    }

    #[test]
    fn grazing_p_incidence_fails() {
        let result = Admittances::compute(&stack(), std::f64::consts::FRAC_PI_2, Polarization::P);
        assert!(matches!(result, Err(MathError::DivisionByZero(_))));
    }
}

/// Admittances of the incident medium, film and substrate, together with
/// the cosine of the propagation angle inside the film.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Admittances {
    pub incident: Complex64,
    pub film: Complex64,
    pub substrate: Complex64,
    pub cos_film: Complex64,
}

/// True when `angle` (radians) is close enough to zero to skip Snell's law.
pub fn is_normal_incidence(angle: f64) -> bool {
    angle.abs() < NORMAL_INCIDENCE_EPSILON
}

impl Admittances {
    pub fn compute(
        stack: &FilmStack,
        angle: f64,
        polarization: Polarization,
    ) -> Result<Self, MathError> {
        if is_normal_incidence(angle) {
            return Ok(Self {
                incident: stack.incident,
                film: stack.film,
                substrate: stack.substrate,
                cos_film: Complex64::new(1.0, 0.0),
            });
        }

        let sin_0 = angle.sin();
        let cos_0 = Complex64::new(angle.cos(), 0.0);
        let cos_film = snell::cos_theta_in(stack.incident, stack.film, sin_0)?;
        let cos_substrate = snell::cos_theta_in(stack.incident, stack.substrate, sin_0)?;

        Ok(Self {
            incident: tilt(stack.incident, cos_0, polarization)?,
            film: tilt(stack.film, cos_film, polarization)?,
            substrate: tilt(stack.substrate, cos_substrate, polarization)?,
            cos_film,
        })
    }
}

fn tilt(n: Complex64, cos_theta: Complex64, polarization: Polarization) -> Result<Complex64, MathError> {
    match polarization {
        Polarization::S => Ok(n * cos_theta),
        Polarization::P => n.checked_div(cos_theta),
    }
}
