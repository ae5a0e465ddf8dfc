//! Polarization selectors and the result of one calculation.

use std::fmt;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::complex::format_complex;
use crate::config::COMPLEX_PRECISION;
use crate::powers::Powers;

/// A single linear polarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarization {
    /// Electric field perpendicular to the plane of incidence.
    S,
    /// Electric field parallel to the plane of incidence.
    P,
}

/// Polarization requested by the caller: one of the linear states, or the
/// unweighted average of both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum PolarizationMode {
    #[serde(alias = "s")]
    S,
    #[serde(alias = "p")]
    P,
    #[serde(rename = "AVG", alias = "avg")]
    Avg,
}

impl From<Polarization> for PolarizationMode {
    fn from(p: Polarization) -> Self {
        match p {
            Polarization::S => PolarizationMode::S,
            Polarization::P => PolarizationMode::P,
        }
    }
}

impl PolarizationMode {
    pub fn description(&self) -> &'static str {
        match self {
            PolarizationMode::S => "S polarization",
            PolarizationMode::P => "P polarization",
            PolarizationMode::Avg => "AVG polarization (mean of S and P)",
        }
    }
}

impl fmt::Display for PolarizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            PolarizationMode::S => "S",
            PolarizationMode::P => "P",
            PolarizationMode::Avg => "AVG",
        };
        write!(f, "{}", tag)
    }
}

/// The S and P results an AVG result was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolarizationComponents {
    pub s: OpticalResult,
    pub p: OpticalResult,
}

/// Outcome of one calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpticalResult {
    pub powers: Powers,
    pub reflection_coefficient: Complex64,
    /// Not derived by the admittance method; zero for S and P results.
    pub transmission_coefficient: Complex64,
    /// Wavelength in nanometres.
    pub wavelength: f64,
    /// Incidence angle in radians.
    pub angle: f64,
    pub energy_conserved: bool,
    pub polarization: PolarizationMode,
    /// Present only on AVG results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Box<PolarizationComponents>>,
}

impl OpticalResult {
    pub fn reflectance(&self) -> f64 {
        self.powers.reflectance
    }

    pub fn transmittance(&self) -> f64 {
        self.powers.transmittance
    }

    pub fn absorbance(&self) -> f64 {
        self.powers.absorbance
    }

    pub fn is_average(&self) -> bool {
        self.polarization == PolarizationMode::Avg
    }

    pub fn s_result(&self) -> Option<&OpticalResult> {
        self.components.as_ref().map(|c| &c.s)
    }

    pub fn p_result(&self) -> Option<&OpticalResult> {
        self.components.as_ref().map(|c| &c.p)
    }
}

impl fmt::Display for OpticalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Polarization      = {}", self.polarization.description())?;
        writeln!(f, "Wavelength        = {:.2} nm", self.wavelength)?;
        writeln!(f, "Incidence angle   = {:.2}°", self.angle.to_degrees())?;
        writeln!(
            f,
            "r                 = {}",
            format_complex(self.reflection_coefficient, COMPLEX_PRECISION)
        )?;
        write!(f, "{}", self.powers)
    }
}
