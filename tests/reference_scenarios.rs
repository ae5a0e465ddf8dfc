use std::{fs::File, io::BufRead, io::BufReader, path::Path};

use anyhow::{Context, Result};
use approx::assert_abs_diff_eq;
use indicatif::ProgressBar;
use num_complex::Complex64;
use thinfilm::{
    film::FilmStack,
    problem::Problem,
    result::{Polarization, PolarizationMode},
    settings, sweep,
    trace::NullRecorder,
    validation,
};

// Tolerance against the tabulated reference values
const TOL: f64 = 1e-9;

/// One row of a reference table: angle in degrees, then S and P (R, T, A).
struct ReferenceRow {
    angle: f64,
    s: [f64; 3],
    p: [f64; 3],
}

fn load_reference(name: &str) -> Result<Vec<ReferenceRow>> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name);
    let file = File::open(&path).with_context(|| format!("opening {:?}", path))?;
    let mut rows = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let values = line
            .split_whitespace()
            .map(|v| v.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("parsing {:?}", line))?;
        anyhow::ensure!(values.len() == 7, "expected 7 columns in {:?}", line);
        rows.push(ReferenceRow {
            angle: values[0],
            s: [values[1], values[2], values[3]],
            p: [values[4], values[5], values[6]],
        });
    }
    Ok(rows)
}

fn scenario_a(angle_deg: f64) -> Problem {
    Problem::new(
        FilmStack::new(
            Complex64::new(1.0, 0.0),
            Complex64::new(2.385, -0.1),
            99.45,
            Complex64::new(1.52, 0.0),
        ),
        550.0,
        angle_deg.to_radians(),
    )
}

#[test]
fn scenario_a_against_tabulated_angles() {
    let reference = load_reference("scenario_a_angle_sweep").unwrap();
    assert_eq!(reference.len(), 9);
    for row in &reference {
        let problem = scenario_a(row.angle);
        for (polarization, expected) in [(Polarization::S, row.s), (Polarization::P, row.p)] {
            let result = problem.compute(polarization, &mut NullRecorder).unwrap();
            assert_abs_diff_eq!(result.reflectance(), expected[0], epsilon = TOL);
            assert_abs_diff_eq!(result.transmittance(), expected[1], epsilon = TOL);
            assert_abs_diff_eq!(result.absorbance(), expected[2], epsilon = TOL);
            assert!(result.energy_conserved);
        }

        let avg = problem
            .compute_with_polarization(PolarizationMode::Avg, &mut NullRecorder)
            .unwrap();
        assert_abs_diff_eq!(avg.reflectance(), (row.s[0] + row.p[0]) / 2.0, epsilon = TOL);
        assert_abs_diff_eq!(avg.transmittance(), (row.s[1] + row.p[1]) / 2.0, epsilon = TOL);
        assert_abs_diff_eq!(avg.absorbance(), (row.s[2] + row.p[2]) / 2.0, epsilon = TOL);
    }
}

#[test]
fn sweep_reproduces_tabulated_angles() {
    let reference = load_reference("scenario_a_angle_sweep").unwrap();
    let result = sweep::angle_sweep_with(
        &scenario_a(0.0),
        PolarizationMode::P,
        0.0,
        80.0,
        9,
        ProgressBar::hidden(),
    )
    .unwrap();
    for (row, computed) in reference.iter().zip(result.rows()) {
        assert_abs_diff_eq!(computed.angle, row.angle, epsilon = 1e-12);
        assert_abs_diff_eq!(computed.reflectance, row.p[0], epsilon = TOL);
        assert_abs_diff_eq!(computed.transmittance, row.p[1], epsilon = TOL);
        assert_abs_diff_eq!(computed.absorbance, row.p[2], epsilon = TOL);
    }
    let (min_angle, _) = result.min_reflectance().unwrap();
    assert_eq!(min_angle, 60.0);
}

#[test]
fn scenario_b_percentages() {
    let mut problem = scenario_a(0.0);
    problem.stack.thickness = 57.65;
    let result = problem.compute(Polarization::S, &mut NullRecorder).unwrap();
    assert_abs_diff_eq!(result.reflectance() * 100.0, 31.4424, epsilon = 0.01);
    assert_abs_diff_eq!(result.transmittance() * 100.0, 59.5727, epsilon = 0.01);
    assert_abs_diff_eq!(result.absorbance() * 100.0, 8.9849, epsilon = 0.01);
}

#[test]
fn built_in_reference_suite_passes() {
    let report = validation::run_reference_suite(&mut NullRecorder).unwrap();
    assert!(report.passed());
}

#[test]
fn default_configuration_runs_scenario_a() {
    let settings = settings::load_default_config().unwrap();
    let result = settings
        .problem()
        .compute_with_polarization(settings.polarization, &mut NullRecorder)
        .unwrap();
    assert_abs_diff_eq!(result.reflectance() * 100.0, 11.1475, epsilon = 0.01);
    assert_abs_diff_eq!(result.transmittance() * 100.0, 70.3446, epsilon = 0.01);
    assert_abs_diff_eq!(result.absorbance() * 100.0, 18.5079, epsilon = 0.01);
}
