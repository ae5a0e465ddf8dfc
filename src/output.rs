//! Text and JSON rendering of results, sweeps and validation reports.

use std::io::Write;

use anyhow::Result;
use itertools::Itertools;
use serde::Serialize;

use crate::result::OpticalResult;
use crate::settings::Settings;
use crate::sweep::{AngleSweep, SweepRow};
use crate::trace::{StepTree, Trace};
use crate::validation::ValidationReport;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::load_default_config;
    use crate::sweep::angle_sweep_with;
    use crate::validation::run_reference_suite;
    use indicatif::ProgressBar;

    fn render<F: FnOnce(&mut Vec<u8>) -> Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn single_result_with_and_without_log() {
        let settings = load_default_config().unwrap();
        let mut trace = Trace::new();
        let result = settings
            .problem()
            .compute_with_polarization(settings.polarization, &mut trace)
            .unwrap();

        let full = render(|w| write_result(w, &settings, &result, &trace, false));
        assert!(full.contains("Step 3: Characteristic matrix:"));
        assert!(full.contains("Reflectance (R)   = 11.14"));

        let quiet = render(|w| write_result(w, &settings, &result, &trace, true));
        assert!(!quiet.contains("Step 3: Characteristic matrix:"));
        assert!(quiet.contains("Absorbance (A)    = 18.50"));
    }

    #[test]
    fn average_lists_both_components() {
        let mut settings = load_default_config().unwrap();
        settings.angle = 45.0;
        let result = settings
            .problem()
            .compute_with_polarization(crate::result::PolarizationMode::Avg, &mut Trace::new())
            .unwrap();
        let text = render(|w| write_result(w, &settings, &result, &Trace::new(), true));
        assert!(text.contains("S polarization"));
        assert!(text.contains("P polarization"));
        assert!(text.contains("AVG polarization (mean of S and P)"));
    }

    #[test]
    fn sweep_table_has_a_row_per_angle() {
        let settings = load_default_config().unwrap();
        let sweep = angle_sweep_with(
            &settings.problem(),
            settings.polarization,
            0.0,
            60.0,
            4,
            ProgressBar::hidden(),
        )
        .unwrap();
        let text = render(|w| write_sweep(w, &sweep));
        let rows = text.lines().filter(|l| l.trim_start().starts_with(char::is_numeric)).count();
        assert_eq!(rows, 4);
        assert!(text.contains("Minimum reflectance"));
    }

    #[test]
    fn json_result_carries_the_trace_tree() {
        let settings = load_default_config().unwrap();
        let mut trace = Trace::new();
        let result = settings
            .problem()
            .compute_with_polarization(settings.polarization, &mut trace)
            .unwrap();
        let text = render(|w| write_json(w, &ResultReport::new(&settings, &result, &trace)));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["result"]["polarization"], "S");
        assert_eq!(value["trace"]["title"], "Thin film characteristic matrix calculation");
        assert!(value["trace"]["substeps"].as_array().unwrap().len() >= 9);
        assert_eq!(value["settings"]["film_refr_index"][1], -0.1);
    }

    #[test]
    fn validation_summary() {
        let mut trace = Trace::new();
        let report = run_reference_suite(&mut trace).unwrap();
        let text = render(|w| write_validation(w, &report, &trace, true));
        assert!(text.contains("default parameters"));
        assert!(text.contains("All reference cases passed"));
    }
}

const RULE: &str = "============================================================";

/// Everything a single calculation produced, for JSON output.
#[derive(Debug, Serialize)]
pub struct ResultReport<'a> {
    pub settings: &'a Settings,
    pub result: &'a OpticalResult,
    pub trace: Option<StepTree<'a>>,
}

impl<'a> ResultReport<'a> {
    pub fn new(settings: &'a Settings, result: &'a OpticalResult, trace: &'a Trace) -> Self {
        Self {
            settings,
            result,
            trace: trace.tree(),
        }
    }
}

/// A sweep flattened for JSON output.
#[derive(Debug, Serialize)]
pub struct SweepReport<'a> {
    pub settings: &'a Settings,
    pub rows: Vec<SweepRow>,
    /// `(angle in degrees, reflectance)`.
    pub min_reflectance: Option<(f64, f64)>,
    pub max_reflectance: Option<(f64, f64)>,
}

impl<'a> SweepReport<'a> {
    pub fn new(settings: &'a Settings, sweep: &AngleSweep) -> Self {
        Self {
            settings,
            rows: sweep.rows().collect(),
            min_reflectance: sweep.min_reflectance(),
            max_reflectance: sweep.max_reflectance(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidationJson<'a> {
    pub report: &'a ValidationReport,
    pub passed: bool,
    pub trace: Option<StepTree<'a>>,
}

impl<'a> ValidationJson<'a> {
    pub fn new(report: &'a ValidationReport, trace: &'a Trace) -> Self {
        Self {
            report,
            passed: report.passed(),
            trace: trace.tree(),
        }
    }
}

/// Pretty-printed JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// The calculation log (unless `quiet`) followed by the summary.
pub fn write_result<W: Write>(
    writer: &mut W,
    settings: &Settings,
    result: &OpticalResult,
    trace: &Trace,
    quiet: bool,
) -> Result<()> {
    if !quiet {
        write!(writer, "{}", trace.full_log())?;
    }
    writeln!(writer, "{}", RULE)?;
    writeln!(writer, "  Summary")?;
    writeln!(writer, "{}", RULE)?;
    write!(writer, "{}", settings)?;
    writeln!(writer)?;
    writeln!(writer, "{}", result)?;

    if let (Some(s), Some(p)) = (result.s_result(), result.p_result()) {
        for component in [s, p] {
            writeln!(writer)?;
            writeln!(writer, "{}", component)?;
        }
    }
    Ok(())
}

/// One row per angle, then the reflectance extremes.
pub fn write_sweep<W: Write>(writer: &mut W, sweep: &AngleSweep) -> Result<()> {
    writeln!(writer, "{}", RULE)?;
    writeln!(writer, "  Angle sweep ({})", sweep.polarization.description())?;
    writeln!(writer, "{}", RULE)?;
    writeln!(
        writer,
        "{:>10} {:>10} {:>10} {:>10} {:>10}",
        "angle (°)", "R (%)", "T (%)", "A (%)", "conserved"
    )?;
    for row in sweep.rows() {
        let values = [
            row.angle,
            row.reflectance * 100.0,
            row.transmittance * 100.0,
            row.absorbance * 100.0,
        ]
        .iter()
        .map(|v| format!("{:>10.4}", v))
        .join(" ");
        writeln!(
            writer,
            "{} {:>10}",
            values,
            if row.energy_conserved { "✓" } else { "✗" }
        )?;
    }

    writeln!(writer)?;
    if let Some((angle, r)) = sweep.min_reflectance() {
        writeln!(writer, "Minimum reflectance = {:.4}% at {:.2}°", r * 100.0, angle)?;
    }
    if let Some((angle, r)) = sweep.max_reflectance() {
        writeln!(writer, "Maximum reflectance = {:.4}% at {:.2}°", r * 100.0, angle)?;
    }
    Ok(())
}

/// The validation log (unless `quiet`) followed by one line per case.
pub fn write_validation<W: Write>(
    writer: &mut W,
    report: &ValidationReport,
    trace: &Trace,
    quiet: bool,
) -> Result<()> {
    if !quiet {
        write!(writer, "{}", trace.full_log())?;
    }
    writeln!(writer, "{}", RULE)?;
    writeln!(writer, "  Validation summary")?;
    writeln!(writer, "{}", RULE)?;
    writeln!(
        writer,
        "{:<28} {}",
        "complex functions",
        if report.identities_hold { "PASS ✓" } else { "FAIL ✗" }
    )?;
    for case in &report.cases {
        writeln!(
            writer,
            "{:<28} {}  (|ΔR| = {:.4}, |ΔT| = {:.4}, |ΔA| = {:.4} percentage points)",
            case.name,
            if case.passed { "PASS ✓" } else { "FAIL ✗" },
            case.error.reflectance,
            case.error.transmittance,
            case.error.absorbance
        )?;
    }
    writeln!(writer)?;
    if report.passed() {
        writeln!(writer, "All reference cases passed")?;
    } else {
        writeln!(writer, "Reference validation FAILED")?;
    }
    Ok(())
}
