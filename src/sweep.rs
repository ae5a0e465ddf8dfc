//! Angle-of-incidence sweeps.
//!
//! A sweep evaluates one stack at evenly spaced incidence angles. Each
//! angle is an independent headless calculation, so the angles are solved
//! in parallel with rayon and collected back in order.

use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use ndarray::Array1;
use ndarray_stats::QuantileExt;
use rayon::prelude::*;
use serde::Serialize;

use crate::error::MathError;
use crate::problem::Problem;
use crate::result::{OpticalResult, PolarizationMode};
use crate::trace::NullRecorder;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::film::FilmStack;
    use num_complex::Complex64;

    fn problem() -> Problem {
        Problem::new(
            FilmStack::new(
                Complex64::new(1.0, 0.0),
                Complex64::new(1.38, 0.0),
                99.6,
                Complex64::new(1.52, 0.0),
            ),
            550.0,
            0.0,
        )
    }

    #[test]
    fn sweep_matches_single_calculations() {
        let sweep = angle_sweep_with(&problem(), PolarizationMode::P, 0.0, 80.0, 9, ProgressBar::hidden())
            .unwrap();
        assert_eq!(sweep.len(), 9);
        assert_eq!(sweep.angles[4], 40.0);
        let mut single = problem();
        single.angle = 40f64.to_radians();
        let expected = single
            .compute_with_polarization(PolarizationMode::P, &mut NullRecorder)
            .unwrap();
        assert_eq!(sweep.results[4], expected);
        assert_eq!(sweep.reflectance[4], expected.reflectance());
    }

    #[test]
    fn p_reflectance_dips_near_brewster() {
        // both interfaces pass their Brewster angles near 50°
        let sweep = angle_sweep_with(&problem(), PolarizationMode::P, 0.0, 85.0, 86, ProgressBar::hidden())
            .unwrap();
        let (angle, r) = sweep.min_reflectance().unwrap();
        assert!(angle > 30.0 && angle < 70.0, "minimum at {}", angle);
        assert!(r < sweep.reflectance[0]);
        let (max_angle, _) = sweep.max_reflectance().unwrap();
        assert_eq!(max_angle, 85.0);
    }

    #[test]
    fn empty_sweep() {
        let sweep = angle_sweep_with(&problem(), PolarizationMode::S, 0.0, 10.0, 0, ProgressBar::hidden())
            .unwrap();
        assert!(sweep.is_empty());
        assert!(sweep.min_reflectance().is_none());
    }

    #[test]
    fn rows_follow_angles() {
        let sweep = angle_sweep_with(&problem(), PolarizationMode::Avg, 10.0, 20.0, 3, ProgressBar::hidden())
            .unwrap();
        let rows: Vec<SweepRow> = sweep.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].angle, 15.0);
        assert!(rows.iter().all(|row| row.energy_conserved));
    }
}

/// R, T and A of one stack over a range of incidence angles.
#[derive(Debug, Clone)]
pub struct AngleSweep {
    pub polarization: PolarizationMode,
    /// Incidence angles in degrees.
    pub angles: Array1<f64>,
    pub reflectance: Array1<f64>,
    pub transmittance: Array1<f64>,
    pub absorbance: Array1<f64>,
    pub results: Vec<OpticalResult>,
}

/// One angle of a sweep, flattened for tabulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepRow {
    /// Degrees.
    pub angle: f64,
    pub reflectance: f64,
    pub transmittance: f64,
    pub absorbance: f64,
    pub energy_conserved: bool,
}

impl AngleSweep {
    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = SweepRow> + '_ {
        self.angles
            .iter()
            .zip(self.results.iter())
            .map(|(angle, result)| SweepRow {
                angle: *angle,
                reflectance: result.reflectance(),
                transmittance: result.transmittance(),
                absorbance: result.absorbance(),
                energy_conserved: result.energy_conserved,
            })
    }

    /// Angle (degrees) and value of the lowest reflectance.
    pub fn min_reflectance(&self) -> Option<(f64, f64)> {
        let i = self.reflectance.argmin().ok()?;
        Some((self.angles[i], self.reflectance[i]))
    }

    /// Angle (degrees) and value of the highest reflectance.
    pub fn max_reflectance(&self) -> Option<(f64, f64)> {
        let i = self.reflectance.argmax().ok()?;
        Some((self.angles[i], self.reflectance[i]))
    }
}

/// Sweeps `points` evenly spaced angles from `start` to `end` degrees, inclusive.
pub fn angle_sweep(
    problem: &Problem,
    mode: PolarizationMode,
    start: f64,
    end: f64,
    points: usize,
) -> Result<AngleSweep, MathError> {
    angle_sweep_with(problem, mode, start, end, points, progress_bar(points))
}

/// As [`angle_sweep`], reporting progress on `pb`.
pub fn angle_sweep_with(
    problem: &Problem,
    mode: PolarizationMode,
    start: f64,
    end: f64,
    points: usize,
    pb: ProgressBar,
) -> Result<AngleSweep, MathError> {
    info!(
        "sweeping {} polarization from {:.2}° to {:.2}° over {} points",
        mode, start, end, points
    );
    let angles = Array1::linspace(start, end, points);

    let results = angles
        .to_vec()
        .par_iter()
        .map(|angle| {
            let mut problem = *problem;
            problem.angle = angle.to_radians();
            let result = problem.compute_with_polarization(mode, &mut NullRecorder);
            pb.inc(1);
            result
        })
        .collect::<Result<Vec<_>, _>>()?;
    pb.finish_and_clear();

    let column = |f: fn(&OpticalResult) -> f64| results.iter().map(f).collect::<Array1<f64>>();
    let sweep = AngleSweep {
        polarization: mode,
        reflectance: column(OpticalResult::reflectance),
        transmittance: column(OpticalResult::transmittance),
        absorbance: column(OpticalResult::absorbance),
        angles,
        results,
    };

    let unconserved = sweep.results.iter().filter(|r| !r.energy_conserved).count();
    if unconserved > 0 {
        warn!("{} of {} sweep points do not conserve energy", unconserved, sweep.len());
    }
    Ok(sweep)
}

fn progress_bar(points: usize) -> ProgressBar {
    let pb = ProgressBar::new(points as u64);
    match ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.green/blue} {pos:>5}/{len:5} {msg} ETA: {eta_precise}",
    ) {
        Ok(style) => pb.set_style(style.progress_chars("█▇▆▅▄▃▂▁")),
        Err(err) => warn!("falling back to the default progress style: {}", err),
    }
    pb.set_message("angle".to_string());
    pb
}
