//! The characteristic-matrix calculation.
//!
//! A [`Problem`] is one film stack illuminated at one wavelength and angle.
//! [`Problem::compute`] runs the calculation for a single linear
//! polarization; [`Problem::compute_with_polarization`] also handles the
//! AVG mode by running S and P under their own trace branches and averaging.
//!
//! Each stage opens a trace step, records what it derived and closes the
//! step as `Completed`, or `Failed` if an arithmetic error ends the
//! calculation. Reflectance, transmittance and absorbance are derived twice,
//! once from the direct `B`/`C` formulas and once through the input
//! admittance `Y = C / B`; both are recorded, and the admittance values are
//! the ones returned.

use log::{info, warn};
use num_complex::Complex64;
use serde::Serialize;

use crate::admittance::{is_normal_incidence, Admittances};
use crate::complex::{checked_ratio, ComplexExt};
use crate::config::ENERGY_TOLERANCE;
use crate::error::MathError;
use crate::film::{self, BoundaryParameters, FilmStack};
use crate::powers::Powers;
use crate::result::{OpticalResult, Polarization, PolarizationComponents, PolarizationMode};
use crate::step::{ResultValue, StepKind};
use crate::trace::{scoped_step, Recorder};


const SINGLE_TITLE: &str = "Thin film characteristic matrix calculation";
const AVG_TITLE: &str = "AVG polarization: mean of S and P";
const INPUT_TITLE: &str = "Input parameters";
const PHASE_TITLE: &str = "Step 1: Phase thickness";
const ADMITTANCE_TITLE: &str = "Step 2: Optical admittance";
const MATRIX_TITLE: &str = "Step 3: Characteristic matrix";
const BOUNDARY_TITLE: &str = "Step 4: Boundary parameters";
const DIRECT_TITLE: &str = "Step 5: TRA from direct formulas";
const ADMITTANCE_TRA_TITLE: &str = "Step 6: TRA from input admittance";
const COMPARISON_TITLE: &str = "Method comparison";
const FINAL_TITLE: &str = "Final results";
const S_BRANCH_TITLE: &str = "Sub-calculation: S polarization";
const P_BRANCH_TITLE: &str = "Sub-calculation: P polarization";
const AVERAGE_TITLE: &str = "AVG: mean of S and P";

/// A film stack at a given wavelength and angle of incidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Problem {
    pub stack: FilmStack,
    /// Wavelength in nanometres.
    pub wavelength: f64,
    /// Incidence angle in radians.
    pub angle: f64,
}

impl Problem {
    pub fn new(stack: FilmStack, wavelength: f64, angle: f64) -> Self {
        Self {
            stack,
            wavelength,
            angle,
        }
    }

    /// Computes R, T and A for one linear polarization as a complete trace session.
    pub fn compute<R: Recorder + ?Sized>(
        &self,
        polarization: Polarization,
        rec: &mut R,
    ) -> Result<OpticalResult, MathError> {
        info!(
            "computing {:?} polarization at {:.2} nm, {:.2}°",
            polarization,
            self.wavelength,
            self.angle.to_degrees()
        );
        rec.header(SINGLE_TITLE);
        let result = self.solve(polarization, rec);
        close_session(rec, &result);
        result
    }

    /// Computes R, T and A for S, P or the average of both.
    ///
    /// For AVG the S and P calculations run under their own branches of the
    /// trace, followed by an averaging branch, all beneath one root.
    pub fn compute_with_polarization<R: Recorder + ?Sized>(
        &self,
        mode: PolarizationMode,
        rec: &mut R,
    ) -> Result<OpticalResult, MathError> {
        match mode {
            PolarizationMode::S => self.compute(Polarization::S, rec),
            PolarizationMode::P => self.compute(Polarization::P, rec),
            PolarizationMode::Avg => {
                info!(
                    "computing AVG polarization at {:.2} nm, {:.2}°",
                    self.wavelength,
                    self.angle.to_degrees()
                );
                rec.header(AVG_TITLE);
                let result = self.solve_average(rec);
                close_session(rec, &result);
                result
            }
        }
    }

    /// Runs every stage for one polarization beneath the currently open step.
    pub(crate) fn solve<R: Recorder + ?Sized>(
        &self,
        polarization: Polarization,
        rec: &mut R,
    ) -> Result<OpticalResult, MathError> {
        let stack = &self.stack;

        step(rec, INPUT_TITLE, StepKind::InputParameters, |rec| {
            rec.complex("n0 (incident medium)", stack.incident);
            rec.complex("n1 (film)", stack.film);
            rec.record_with("d (thickness)", stack.thickness.into(), "nm", "");
            rec.complex("ns (substrate)", stack.substrate);
            rec.record_with("λ (wavelength)", self.wavelength.into(), "nm", "");
            rec.record_with("θ0 (incidence angle)", self.angle.to_degrees().into(), "°", "");
            rec.text("Polarization", PolarizationMode::from(polarization).description());
            Ok(())
        })?;

        let delta = step(rec, PHASE_TITLE, StepKind::PhaseThickness, |rec| {
            let cos_0 = Complex64::new(self.angle.cos(), 0.0);
            let delta = film::phase_thickness(stack.thickness, self.wavelength, stack.film, cos_0);
            rec.record_with("δ", delta.into(), "rad", "2π·d·n1·cos(θ0)/λ");
            Ok(delta)
        })?;

        let (eta, delta) = step(rec, ADMITTANCE_TITLE, StepKind::OpticalAdmittance, |rec| {
            let eta = Admittances::compute(stack, self.angle, polarization)?;
            let mut delta = delta;
            if !is_normal_incidence(self.angle) {
                rec.complex("cos(θ1) (film)", eta.cos_film);
                delta = film::phase_thickness(stack.thickness, self.wavelength, stack.film, eta.cos_film);
                rec.record_with("δ (refracted)", delta.into(), "rad", "2π·d·n1·cos(θ1)/λ");
            }
            rec.complex("η0 (incident medium)", eta.incident);
            rec.complex("η1 (film)", eta.film);
            rec.complex("ηs (substrate)", eta.substrate);
            Ok((eta, delta))
        })?;

        let m = step(rec, MATRIX_TITLE, StepKind::CharacteristicMatrix, |rec| {
            rec.complex("cos(δ)", delta.cos());
            rec.complex("sin(δ)", delta.sin());
            let m = film::characteristic_matrix(delta, eta.film)?;
            rec.matrix("Characteristic matrix M", &m);
            Ok(m)
        })?;

        let bc = step(rec, BOUNDARY_TITLE, StepKind::BoundaryCondition, |rec| {
            let bc = film::boundary_parameters(&m, eta.substrate)?;
            rec.record_with("B", bc.b.into(), "", "M00 + M01·ηs");
            rec.record_with("C", bc.c.into(), "", "M10 + M11·ηs");
            Ok(bc)
        })?;

        let direct = step(rec, DIRECT_TITLE, StepKind::TraCalculation, |rec| {
            direct_powers(&eta, &bc, rec)
        })?;

        let (powers, r) = step(
            rec,
            ADMITTANCE_TRA_TITLE,
            StepKind::ReflectionTransmission,
            |rec| admittance_powers(&eta, &bc, rec),
        )?;

        step(rec, COMPARISON_TITLE, StepKind::Comparison, |rec| {
            let diff = direct.abs_diff(&powers);
            rec.scalar("|ΔR|", diff.reflectance);
            rec.scalar("|ΔT|", diff.transmittance);
            rec.scalar("|ΔA|", diff.absorbance);
            if diff.reflectance.max(diff.transmittance).max(diff.absorbance) > ENERGY_TOLERANCE {
                warn!("direct and admittance methods diverge: {:?}", diff);
            }
            Ok(())
        })?;

        let energy_conserved = step(rec, FINAL_TITLE, StepKind::FinalResults, |rec| {
            Ok(record_final_results(rec, &powers))
        })?;

        Ok(OpticalResult {
            powers,
            reflection_coefficient: r,
            transmission_coefficient: Complex64::new(0.0, 0.0),
            wavelength: self.wavelength,
            angle: self.angle,
            energy_conserved,
            polarization: polarization.into(),
            components: None,
        })
    }

    fn solve_average<R: Recorder + ?Sized>(&self, rec: &mut R) -> Result<OpticalResult, MathError> {
        let s = step(rec, S_BRANCH_TITLE, StepKind::Header, |rec| {
            self.solve(Polarization::S, rec)
        })?;
        let p = step(rec, P_BRANCH_TITLE, StepKind::Header, |rec| {
            self.solve(Polarization::P, rec)
        })?;

        let (powers, energy_conserved) = step(rec, AVERAGE_TITLE, StepKind::FinalResults, |rec| {
            for (tag, result) in [("S", &s), ("P", &p)] {
                rec.scalar(&format!("{} - reflectance", tag), result.reflectance());
                rec.scalar(&format!("{} - transmittance", tag), result.transmittance());
                rec.scalar(&format!("{} - absorbance", tag), result.absorbance());
            }
            let mut powers = s.powers + p.powers;
            powers /= 2.0;
            rec.scalar("AVG - reflectance", powers.reflectance);
            rec.scalar("AVG - transmittance", powers.transmittance);
            rec.scalar("AVG - absorbance", powers.absorbance);
            let conserved = record_final_results(rec, &powers);
            Ok((powers, conserved))
        })?;

        Ok(OpticalResult {
            powers,
            reflection_coefficient: (s.reflection_coefficient + p.reflection_coefficient) / 2.0,
            transmission_coefficient: (s.transmission_coefficient + p.transmission_coefficient)
                / 2.0,
            wavelength: self.wavelength,
            angle: self.angle,
            energy_conserved,
            polarization: PolarizationMode::Avg,
            components: Some(Box::new(PolarizationComponents { s, p })),
        })
    }
}

fn step<R, T, F>(rec: &mut R, title: &str, kind: StepKind, f: F) -> Result<T, MathError>
where
    R: Recorder + ?Sized,
    F: FnOnce(&mut R) -> Result<T, MathError>,
{
    scoped_step(rec, title, kind, f)
}

fn close_session<R: Recorder + ?Sized>(rec: &mut R, result: &Result<OpticalResult, MathError>) {
    match result {
        Ok(_) => rec.complete_session(),
        // the failing step has already returned control to the root
        Err(_) => rec.fail_step(),
    }
}

/// `R = |η0B - C|² / |D|²`, `T = 4 Re(η0) Re(ηs) / |D|²` and
/// `A = 4 Re(η0) (Re(BC*) - Re(ηs)) / |D|²` with `D = η0B + C`.
fn direct_powers<R: Recorder + ?Sized>(
    eta: &Admittances,
    bc: &BoundaryParameters,
    rec: &mut R,
) -> Result<Powers, MathError> {
    let denominator = eta.incident * bc.b + bc.c;
    let denominator_sq = denominator.abs_squared();
    let bc_conj = bc.b * bc.c.conj();
    rec.complex("η0B + C", denominator);
    rec.complex("(η0B + C)*", denominator.conj());
    rec.scalar("|η0B + C|²", denominator_sq);
    rec.complex("BC*", bc_conj);
    rec.scalar("Re(BC*)", bc_conj.re);

    let numerator_r = eta.incident * bc.b - bc.c;
    let numerator_r_sq = numerator_r.abs_squared();
    rec.complex("η0B - C", numerator_r);
    rec.scalar("|η0B - C|²", numerator_r_sq);
    let reflectance = checked_ratio(numerator_r_sq, denominator_sq)?;
    rec.record_with("R (direct)", reflectance.into(), "", "|η0B - C|² / |η0B + C|²");

    let numerator_t = 4.0 * eta.incident.re * eta.substrate.re;
    rec.scalar("4·Re(η0)·Re(ηs)", numerator_t);
    let transmittance = checked_ratio(numerator_t, denominator_sq)?;
    rec.record_with("T (direct)", transmittance.into(), "", "4·Re(η0)·Re(ηs) / |η0B + C|²");

    let numerator_a = 4.0 * eta.incident.re * (bc_conj.re - eta.substrate.re);
    rec.scalar("Re(BC*) - Re(ηs)", bc_conj.re - eta.substrate.re);
    rec.scalar("4·Re(η0)·(Re(BC*) - Re(ηs))", numerator_a);
    let absorbance = checked_ratio(numerator_a, denominator_sq)?;
    rec.record_with(
        "A (direct)",
        absorbance.into(),
        "",
        "4·Re(η0)·(Re(BC*) - Re(ηs)) / |η0B + C|²",
    );

    Ok(Powers::new(reflectance, transmittance, absorbance))
}

/// `Y = C / B`, `r = (η0 - Y) / (η0 + Y)`, `R = |r|²`,
/// `T = Re(ηs) (1 - R) / Re(BC*)` and `A = 1 - R - T`.
fn admittance_powers<R: Recorder + ?Sized>(
    eta: &Admittances,
    bc: &BoundaryParameters,
    rec: &mut R,
) -> Result<(Powers, Complex64), MathError> {
    let y = bc.c.checked_div(bc.b)?;
    rec.record_with("Y", y.into(), "", "C / B");

    let r = (eta.incident - y).checked_div(eta.incident + y)?;
    rec.record_with("r (reflection coefficient)", r.into(), "", "(η0 - Y) / (η0 + Y)");
    let reflectance = r.abs_squared();

    let bc_conj = bc.b * bc.c.conj();
    let transmittance = checked_ratio(eta.substrate.re * (1.0 - reflectance), bc_conj.re)?;
    let absorbance = 1.0 - reflectance - transmittance;
    rec.record_with("R (admittance)", reflectance.into(), "", "|r|²");
    rec.record_with(
        "T (admittance)",
        transmittance.into(),
        "",
        "Re(ηs)·(1 - R) / Re(BC*)",
    );
    rec.record_with("A (admittance)", absorbance.into(), "", "1 - R - T");

    Ok((Powers::new(reflectance, transmittance, absorbance), r))
}

/// Records the final R, T, A and the energy check, returning whether energy is conserved.
fn record_final_results<R: Recorder + ?Sized>(rec: &mut R, powers: &Powers) -> bool {
    let conserved = powers.is_conserved();
    let percent = powers.to_percent();
    rec.record_with("Reflectance", percent.reflectance.into(), "%", "");
    rec.record_with("Transmittance", percent.transmittance.into(), "%", "");
    rec.record_with("Absorbance", percent.absorbance.into(), "%", "");
    rec.record_with("R + T + A", (powers.total() * 100.0).into(), "%", "");
    rec.record(
        "Energy conservation",
        ResultValue::from(if conserved { "conserved" } else { "not conserved" }),
    );

    rec.note("");
    for line in powers.to_string().lines() {
        rec.note(line);
    }
    rec.note("");
    rec.note(&format!(
        "Energy conservation check: R + T + A = {:.4}%",
        powers.total() * 100.0
    ));
    rec.note(&format!("Error: {:.6}%", powers.conservation_error() * 100.0));
    rec.note(&format!(
        "Result: {}",
        if conserved { "PASS ✓" } else { "FAIL ✗" }
    ));
    rec.note("");

    if !conserved {
        warn!(
            "energy not conserved: R + T + A = {:.8}",
            powers.total()
        );
    }
    conserved
}
