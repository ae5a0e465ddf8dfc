//! Complex arithmetic for absorbing media.
//!
//! Refractive indices, admittances and phase thicknesses are all complex
//! once the film absorbs. This module extends [`Complex64`] with the
//! operations the characteristic-matrix method needs on top of what
//! `num-complex` already provides:
//! - Division and reciprocal that refuse near-zero denominators
//! - The principal square root, computed from magnitude and phase
//! - Fixed-precision text rendering for the calculation log
//!
//! `cos`, `sin` and `exp` are the inherent `Complex64` methods, which follow
//! `cos(a+bi) = cos a cosh b - i sin a sinh b`,
//! `sin(a+bi) = sin a cosh b + i cos a sinh b` and
//! `exp(a+bi) = e^a (cos b + i sin b)`.

use num_complex::Complex64;

use crate::config::{DISPLAY_IMAG_EPSILON, DIVISION_EPSILON};
use crate::error::MathError;

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn divide_by_complex() {
        let a = Complex64::new(1.0, 2.0);
        let b = Complex64::new(3.0, -4.0);
        let q = a.checked_div(b).unwrap();
        // (1 + 2i) / (3 - 4i) = (-5 + 10i) / 25
        assert!((q.re + 0.2).abs() < 1e-12);
        assert!((q.im - 0.4).abs() < 1e-12);
    }

    #[test]
    fn divide_by_zero_is_an_error() {
        let a = Complex64::new(1.0, 1.0);
        assert!(matches!(
            a.checked_div(Complex64::new(0.0, 0.0)),
            Err(MathError::DivisionByZero(_))
        ));
        assert!(matches!(
            a.checked_div(Complex64::new(1e-9, 0.0)),
            Err(MathError::DivisionByZero(_))
        ));
        assert!(a.checked_div_real(0.0).is_err());
        assert!(Complex64::new(0.0, 0.0).checked_recip().is_err());
        assert!(checked_ratio(1.0, 1e-16).is_err());
    }

    #[test]
    fn reciprocal() {
        let z = Complex64::new(0.0, 2.0);
        let r = z.checked_recip().unwrap();
        assert!(r.re.abs() < 1e-12);
        assert!((r.im + 0.5).abs() < 1e-12);
    }

    #[test]
    fn principal_sqrt_of_negative_real() {
        let root = Complex64::new(-4.0, 0.0).principal_sqrt();
        assert!(root.re.abs() < 1e-12);
        assert!((root.im - 2.0).abs() < 1e-12);
    }

    #[test]
    fn principal_sqrt_round_trip() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let z = Complex64::new(rng.random_range(-50.0..50.0), rng.random_range(-50.0..50.0));
            let root = z.principal_sqrt();
            let back = root * root;
            assert!((back - z).norm() < 1e-9, "z = {z}, sqrt(z)^2 = {back}");
            assert!(root.re >= 0.0);
        }
    }

    #[test]
    fn transcendental_identities() {
        let z = Complex64::new(0.7, -0.3);
        let cos = z.cos();
        let sin = z.sin();
        assert!((cos.re - 0.7_f64.cos() * (-0.3_f64).cosh()).abs() < 1e-12);
        assert!((cos.im + 0.7_f64.sin() * (-0.3_f64).sinh()).abs() < 1e-12);
        assert!((sin.re - 0.7_f64.sin() * (-0.3_f64).cosh()).abs() < 1e-12);
        assert!((sin.im - 0.7_f64.cos() * (-0.3_f64).sinh()).abs() < 1e-12);
        // cos^2 + sin^2 = 1 holds off the real axis too
        assert!((cos * cos + sin * sin - Complex64::new(1.0, 0.0)).norm() < 1e-12);

        let e = z.exp();
        assert!((e.norm() - 0.7_f64.exp()).abs() < 1e-12);
        assert!((e.arg() + 0.3).abs() < 1e-12);
    }

    #[test]
    fn format_suppresses_tiny_imaginary() {
        assert_eq!(format_complex(Complex64::new(1.5, 1e-12), 4), "1.5000");
        assert_eq!(format_complex(Complex64::new(2.385, -0.1), 4), "2.3850 - 0.1000i");
        assert_eq!(format_complex(Complex64::new(-0.25, 0.5), 4), "-0.2500 + 0.5000i");
    }
}

/// Checked operations on complex numbers used by the optics engine.
pub trait ComplexExt: Sized {
    /// Divides by `rhs`, failing when `|rhs|^2` is below [`DIVISION_EPSILON`].
    fn checked_div(self, rhs: Self) -> Result<Self, MathError>;
    /// Divides by a real scalar, failing when `|rhs|` is below [`DIVISION_EPSILON`].
    fn checked_div_real(self, rhs: f64) -> Result<Self, MathError>;
    /// Returns `1 / self`, failing for near-zero values.
    fn checked_recip(self) -> Result<Self, MathError>;
    /// Principal square root, `sqrt(|z|) * (cos(arg z / 2) + i sin(arg z / 2))`.
    ///
    /// Only one of the two roots is produced; callers needing the other must negate it.
    fn principal_sqrt(self) -> Self;
    /// `re^2 + im^2`.
    fn abs_squared(self) -> f64;
}

impl ComplexExt for Complex64 {
    fn checked_div(self, rhs: Self) -> Result<Self, MathError> {
        let denominator = rhs.abs_squared();
        if denominator.abs() < DIVISION_EPSILON {
            return Err(MathError::DivisionByZero(denominator));
        }
        Ok(Complex64::new(
            (self.re * rhs.re + self.im * rhs.im) / denominator,
            (self.im * rhs.re - self.re * rhs.im) / denominator,
        ))
    }

    fn checked_div_real(self, rhs: f64) -> Result<Self, MathError> {
        if rhs.abs() < DIVISION_EPSILON {
            return Err(MathError::DivisionByZero(rhs * rhs));
        }
        Ok(Complex64::new(self.re / rhs, self.im / rhs))
    }

    fn checked_recip(self) -> Result<Self, MathError> {
        let denominator = self.abs_squared();
        if denominator.abs() < DIVISION_EPSILON {
            return Err(MathError::DivisionByZero(denominator));
        }
        Ok(Complex64::new(self.re / denominator, -self.im / denominator))
    }

    fn principal_sqrt(self) -> Self {
        let magnitude = self.abs_squared().sqrt();
        let phase = self.im.atan2(self.re) / 2.0;
        Complex64::from_polar(magnitude.sqrt(), phase)
    }

    fn abs_squared(self) -> f64 {
        self.re * self.re + self.im * self.im
    }
}

/// Real division with the same near-zero guard as [`ComplexExt::checked_div_real`].
pub fn checked_ratio(numerator: f64, denominator: f64) -> Result<f64, MathError> {
    if denominator.abs() < DIVISION_EPSILON {
        return Err(MathError::DivisionByZero(denominator * denominator));
    }
    Ok(numerator / denominator)
}

/// Renders `z` as `re ± imi` with `precision` decimals, or as a bare real
/// number when the imaginary part is below [`DISPLAY_IMAG_EPSILON`].
pub fn format_complex(z: Complex64, precision: usize) -> String {
    if z.im.abs() < DISPLAY_IMAG_EPSILON {
        format!("{:.*}", precision, z.re)
    } else if z.im > 0.0 {
        format!("{:.*} + {:.*}i", precision, z.re, precision, z.im)
    } else {
        format!("{:.*} - {:.*}i", precision, z.re, precision, z.im.abs())
    }
}
