//! Reference validation suite.
//!
//! Two published single-film cases are recomputed and compared with their
//! expected reflectance, transmittance and absorbance. A case passes when
//! every quantity is within [`VALIDATION_TOLERANCE`] percentage points.
//! Before the cases run, a handful of complex function identities are
//! checked so that a broken arithmetic layer is reported as such.

use std::f64::consts::PI;

use log::{info, warn};
use num_complex::Complex64;
use serde::Serialize;

use crate::complex::ComplexExt;
use crate::config::{IDENTITY_TOLERANCE, VALIDATION_TOLERANCE};
use crate::error::MathError;
use crate::film::FilmStack;
use crate::powers::Powers;
use crate::problem::Problem;
use crate::result::Polarization;
use crate::step::StepKind;
use crate::trace::{scoped_step, Recorder};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepStatus;
    use crate::trace::{NullRecorder, Trace};

    #[test]
    fn reference_cases_pass() {
        let report = run_reference_suite(&mut NullRecorder).unwrap();
        assert!(report.identities_hold);
        assert_eq!(report.cases.len(), 2);
        for case in &report.cases {
            assert!(case.passed, "{} failed: {:?}", case.name, case.error);
        }
        assert!(report.passed());
    }

    #[test]
    fn suite_trace_layout() {
        let mut trace = Trace::new();
        run_reference_suite(&mut trace).unwrap();
        let root = trace.root().unwrap();
        let titles: Vec<&str> = trace.children(root).map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            [
                IDENTITY_TITLE,
                "Test case 1: default parameters",
                "Test case 2: standard validation case"
            ]
        );
        let case = trace.find("Test case 1: default parameters").unwrap();
        assert_eq!(case.kind, StepKind::Validation);
        assert!(trace.children(case.id).count() >= 9);
        assert!(case.result("Validation").is_some());
        assert!(trace.steps().iter().all(|s| s.status == StepStatus::Completed));
        assert!(trace.full_log().contains("Expected: R=11.1475%, T=70.3446%, A=18.5079%"));
    }

    #[test]
    fn mismatched_expectation_fails() {
        let mut case = reference_cases().remove(0);
        case.expected.reflectance += 0.05;
        let outcome = case.evaluate(&mut NullRecorder).unwrap();
        assert!(!outcome.passed);
        assert!((outcome.error.reflectance - 0.05).abs() < 0.01);
    }
}

const SUITE_TITLE: &str = "Thin film calculator validation";
const IDENTITY_TITLE: &str = "Complex function check";

/// A stack with known R, T and A.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceCase {
    pub name: &'static str,
    pub title: &'static str,
    pub problem: Problem,
    pub polarization: Polarization,
    /// Expected values in percent.
    pub expected: Powers,
}

/// Comparison of one reference case against its computed values, all in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseOutcome {
    pub name: String,
    pub expected: Powers,
    pub computed: Powers,
    pub error: Powers,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub identities_hold: bool,
    pub cases: Vec<CaseOutcome>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.identities_hold && self.cases.iter().all(|c| c.passed)
    }
}

/// The absorbing-film cases at 550 nm, normal incidence, S polarization.
pub fn reference_cases() -> Vec<ReferenceCase> {
    let stack = |thickness| {
        FilmStack::new(
            Complex64::new(1.0, 0.0),
            Complex64::new(2.385, -0.1),
            thickness,
            Complex64::new(1.52, 0.0),
        )
    };
    vec![
        ReferenceCase {
            name: "default parameters",
            title: "Test case 1: default parameters",
            problem: Problem::new(stack(99.45), 550.0, 0.0),
            polarization: Polarization::S,
            expected: Powers::new(11.1475, 70.3446, 18.5079),
        },
        ReferenceCase {
            name: "standard validation case",
            title: "Test case 2: standard validation case",
            problem: Problem::new(stack(57.65), 550.0, 0.0),
            polarization: Polarization::S,
            expected: Powers::new(31.4424, 59.5727, 8.9849),
        },
    ]
}

impl ReferenceCase {
    /// Computes the case under its own step and records the comparison there.
    pub fn evaluate<R: Recorder + ?Sized>(&self, rec: &mut R) -> Result<CaseOutcome, MathError> {
        scoped_step(rec, self.title, StepKind::Validation, |rec| {
            let result = self.problem.solve(self.polarization, rec)?;
            let computed = result.powers.to_percent();
            let error = computed.abs_diff(&self.expected);
            let passed = error.reflectance < VALIDATION_TOLERANCE
                && error.transmittance < VALIDATION_TOLERANCE
                && error.absorbance < VALIDATION_TOLERANCE;

            rec.note(&format!("Validation: {}", self.name));
            rec.note(&format!(
                "Expected: R={:.4}%, T={:.4}%, A={:.4}%",
                self.expected.reflectance, self.expected.transmittance, self.expected.absorbance
            ));
            rec.note(&format!(
                "Computed: R={:.4}%, T={:.4}%, A={:.4}%",
                computed.reflectance, computed.transmittance, computed.absorbance
            ));
            rec.note(&format!(
                "Error:    R={:.4}%, T={:.4}%, A={:.4}%",
                error.reflectance, error.transmittance, error.absorbance
            ));
            rec.text("Validation", if passed { "PASS ✓" } else { "FAIL ✗" });
            rec.note("");

            if passed {
                info!("reference case '{}' passed", self.name);
            } else {
                warn!("reference case '{}' failed: {:?}", self.name, error);
            }
            Ok(CaseOutcome {
                name: self.name.to_string(),
                expected: self.expected,
                computed,
                error,
                passed,
            })
        })
    }
}

/// Runs the identity check and every reference case as one trace session.
pub fn run_reference_suite<R: Recorder + ?Sized>(
    rec: &mut R,
) -> Result<ValidationReport, MathError> {
    rec.header(SUITE_TITLE);
    let report = run_cases(rec);
    match report {
        Ok(_) => rec.complete_session(),
        Err(_) => rec.fail_step(),
    }
    report
}

fn run_cases<R: Recorder + ?Sized>(rec: &mut R) -> Result<ValidationReport, MathError> {
    let identities_hold = scoped_step(rec, IDENTITY_TITLE, StepKind::Validation, |rec| {
        check_identities(rec)
    })?;
    let cases = reference_cases()
        .iter()
        .map(|case| case.evaluate(rec))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ValidationReport {
        identities_hold,
        cases,
    })
}

fn check_identities<R: Recorder + ?Sized>(rec: &mut R) -> Result<bool, MathError> {
    let one = Complex64::new(1.0, 0.0);
    let z = Complex64::new(0.8, -0.3);
    let checks = [
        (
            "sqrt(-4)",
            Complex64::new(-4.0, 0.0).principal_sqrt(),
            Complex64::new(0.0, 2.0),
        ),
        ("exp(iπ)", (Complex64::i() * PI).exp(), -one),
        ("sin²(z) + cos²(z)", z.sin().powi(2) + z.cos().powi(2), one),
        ("z / z", z.checked_div(z)?, one),
        ("z · (1 / z)", z * z.checked_recip()?, one),
    ];

    let mut hold = true;
    for (name, value, expected) in checks {
        rec.complex(name, value);
        if (value - expected).norm() >= IDENTITY_TOLERANCE {
            warn!("complex identity {} gave {}", name, value);
            hold = false;
        }
    }
    rec.text("Complex functions", if hold { "PASS ✓" } else { "FAIL ✗" });
    Ok(hold)
}
