//! Energy bookkeeping for a film calculation.
//!
//! Reflectance, transmittance and absorbance are fractions of the incident
//! power and should sum to one. [`Powers`] carries the three together so that
//! they can be averaged over polarizations, compared between the two
//! formula sets, and checked for conservation.

use std::{fmt, ops::*};

use serde::Serialize;

use crate::config::ENERGY_TOLERANCE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_two() {
        let s = Powers::new(0.2, 0.7, 0.1);
        let p = Powers::new(0.1, 0.85, 0.05);
        let mut avg = s + p;
        avg /= 2.0;
        assert_eq!(avg.reflectance, (0.2 + 0.1) / 2.0);
        assert_eq!(avg.transmittance, (0.7 + 0.85) / 2.0);
        assert_eq!(avg.absorbance, (0.1 + 0.05) / 2.0);
    }

    #[test]
    fn conservation_tolerance() {
        assert!(Powers::new(0.3, 0.5, 0.2).is_conserved());
        assert!(Powers::new(0.3, 0.5, 0.2 + 5e-7).is_conserved());
        assert!(!Powers::new(0.3, 0.5, 0.2 + 5e-6).is_conserved());
        assert!((Powers::new(0.3, 0.5, 0.3).conservation_error() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn abs_diff_is_symmetric() {
        let a = Powers::new(0.2, 0.7, 0.1);
        let b = Powers::new(0.25, 0.6, 0.15);
        assert_eq!(a.abs_diff(&b), b.abs_diff(&a));
        assert!((a.abs_diff(&b).transmittance - 0.1).abs() < 1e-12);
    }
}

/// Reflectance, transmittance and absorbance as fractions of incident power.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
pub struct Powers {
    pub reflectance: f64,
    pub transmittance: f64,
    pub absorbance: f64,
}

impl Add for Powers {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            reflectance: self.reflectance + other.reflectance,
            transmittance: self.transmittance + other.transmittance,
            absorbance: self.absorbance + other.absorbance,
        }
    }
}

impl AddAssign for Powers {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl DivAssign<f64> for Powers {
    fn div_assign(&mut self, rhs: f64) {
        self.reflectance /= rhs;
        self.transmittance /= rhs;
        self.absorbance /= rhs;
    }
}

impl Powers {
    pub fn new(reflectance: f64, transmittance: f64, absorbance: f64) -> Self {
        Self {
            reflectance,
            transmittance,
            absorbance,
        }
    }

    /// `R + T + A`.
    pub fn total(&self) -> f64 {
        self.reflectance + self.transmittance + self.absorbance
    }

    /// `|R + T + A - 1|`.
    pub fn conservation_error(&self) -> f64 {
        (self.total() - 1.0).abs()
    }

    /// True when the total is within [`ENERGY_TOLERANCE`] of one.
    pub fn is_conserved(&self) -> bool {
        self.conservation_error() < ENERGY_TOLERANCE
    }

    /// Component-wise absolute difference.
    pub fn abs_diff(&self, other: &Self) -> Self {
        Self {
            reflectance: (self.reflectance - other.reflectance).abs(),
            transmittance: (self.transmittance - other.transmittance).abs(),
            absorbance: (self.absorbance - other.absorbance).abs(),
        }
    }

    /// The same quantities in percent.
    pub fn to_percent(&self) -> Self {
        Self {
            reflectance: self.reflectance * 100.0,
            transmittance: self.transmittance * 100.0,
            absorbance: self.absorbance * 100.0,
        }
    }
}

impl fmt::Display for Powers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reflectance (R)   = {:.4}%", self.reflectance * 100.0)?;
        writeln!(f, "Transmittance (T) = {:.4}%", self.transmittance * 100.0)?;
        writeln!(f, "Absorbance (A)    = {:.4}%", self.absorbance * 100.0)?;
        writeln!(f, "Total             = {:.4}%", self.total() * 100.0)?;
        write!(
            f,
            "Energy conserved  = {}",
            if self.is_conserved() { "✓" } else { "✗" }
        )
    }
}
