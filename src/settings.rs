//! Runtime settings.
//!
//! Settings are layered from `config/default.toml` (or `config/local.toml`),
//! an optional material preset, `THINFILM_*` environment variables and
//! finally the command line.

use anyhow::{bail, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use log::{debug, info};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::complex::format_complex;
use crate::config::COMPLEX_PRECISION;
use crate::film::FilmStack;
use crate::problem::Problem;
use crate::result::PolarizationMode;

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(source: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn default_config_is_the_reference_stack() {
        let settings = load_default_config().unwrap();
        assert_eq!(settings.incident_refr_index, Complex64::new(1.0, 0.0));
        assert_eq!(settings.film_refr_index, Complex64::new(2.385, -0.1));
        assert_eq!(settings.substrate_refr_index, Complex64::new(1.52, 0.0));
        assert_eq!(settings.thickness, 99.45);
        assert_eq!(settings.wavelength, 550.0);
        assert_eq!(settings.angle, 0.0);
        assert_eq!(settings.polarization, PolarizationMode::S);
        assert!(settings.sweep.is_none());
    }

    #[test]
    fn presets_parse() {
        let root = retrieve_project_root().unwrap();
        for name in ["mgf2", "tio2", "sio2"] {
            let settings: Settings = Config::builder()
                .add_source(File::from(root.join("config/default.toml")))
                .add_source(File::from(preset_path(&root, name)))
                .build()
                .unwrap()
                .try_deserialize()
                .unwrap();
            settings.validate().unwrap();
            assert_eq!(settings.wavelength, 550.0);
        }
    }

    #[test]
    fn toml_arrays_and_sweep_block() {
        let settings = from_toml(
            r#"
            incident_refr_index = [1.0, 0.0]
            film_refr_index = [1.38, 0.0]
            substrate_refr_index = [1.52, -0.01]
            thickness = 100.0
            wavelength = 600.0
            angle = 30.0
            polarization = "AVG"

            [sweep]
            start = 0.0
            end = 80.0
            points = 17
            "#,
        );
        assert_eq!(settings.substrate_refr_index, Complex64::new(1.52, -0.01));
        assert_eq!(settings.polarization, PolarizationMode::Avg);
        assert_eq!(
            settings.sweep,
            Some(SweepSettings {
                start: 0.0,
                end: 80.0,
                points: 17
            })
        );
        let problem = settings.problem();
        assert!((problem.angle - 30f64.to_radians()).abs() < 1e-15);
        assert_eq!(problem.stack.film, Complex64::new(1.38, 0.0));
    }

    #[test]
    fn validation_rejects_bad_inputs() {
        let good = load_default_config().unwrap();
        assert!(good.validate().is_ok());

        let mut bad = good.clone();
        bad.thickness = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = good.clone();
        bad.wavelength = -550.0;
        assert!(bad.validate().is_err());

        let mut bad = good.clone();
        bad.angle = 90.0;
        assert!(bad.validate().is_err());

        let mut bad = good.clone();
        bad.sweep = Some(SweepSettings {
            start: 0.0,
            end: 95.0,
            points: 10,
        });
        assert!(bad.validate().is_err());
    }

    #[test]
    fn cli_arguments_override_the_file() {
        let args = CliArgs::parse_from([
            "thinfilm",
            "--n1",
            "2.0-0.05i",
            "-d",
            "120",
            "-a",
            "-45",
            "-p",
            "avg",
            "--sweep",
            "0",
            "60",
            "--points",
            "7",
        ]);
        let mut settings = load_default_config().unwrap();
        settings.apply_args(&args);
        assert_eq!(settings.film_refr_index, Complex64::new(2.0, -0.05));
        assert_eq!(settings.thickness, 120.0);
        assert_eq!(settings.angle, -45.0);
        assert_eq!(settings.polarization, PolarizationMode::Avg);
        assert_eq!(
            settings.sweep,
            Some(SweepSettings {
                start: 0.0,
                end: 60.0,
                points: 7
            })
        );
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn layers_apply_in_order() {
        // preset over the file, environment over the preset, arguments over both
        std::env::set_var("THINFILM_THICKNESS", "123.5");
        std::env::set_var("THINFILM_WAVELENGTH", "600");
        let args = CliArgs::parse_from([
            "thinfilm", "--preset", "tio2", "-w", "633", "-a", "30", "-p", "avg",
        ]);
        let settings = load_config(&args);
        std::env::remove_var("THINFILM_THICKNESS");
        std::env::remove_var("THINFILM_WAVELENGTH");

        let settings = settings.unwrap();
        assert_eq!(settings.film_refr_index, Complex64::new(2.4, 0.0));
        assert_eq!(settings.substrate_refr_index, Complex64::new(1.52, 0.0));
        assert_eq!(settings.thickness, 123.5);
        assert_eq!(settings.wavelength, 633.0);
        assert_eq!(settings.angle, 30.0);
        assert_eq!(settings.polarization, PolarizationMode::Avg);
    }

    #[test]
    fn sweep_without_points_uses_default() {
        let args = CliArgs::parse_from(["thinfilm", "--sweep", "10", "20"]);
        let mut settings = load_default_config().unwrap();
        settings.apply_args(&args);
        assert_eq!(settings.sweep.map(|s| s.points), Some(DEFAULT_SWEEP_POINTS));
    }
}

/// Number of angles in a sweep when none is given.
pub const DEFAULT_SWEEP_POINTS: usize = 91;

/// Incidence-angle sweep range, in degrees.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct SweepSettings {
    pub start: f64,
    pub end: f64,
    pub points: usize,
}

/// Runtime configuration for the application.
///
/// Refractive indices use the `N = n - ik` convention and are written in
/// TOML as `[re, im]`. The angle is in degrees here and converted to
/// radians by [`Settings::problem`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    pub incident_refr_index: Complex64,
    pub film_refr_index: Complex64,
    pub substrate_refr_index: Complex64,
    /// Film thickness in nanometres.
    pub thickness: f64,
    /// Wavelength in nanometres.
    pub wavelength: f64,
    /// Incidence angle in degrees.
    pub angle: f64,
    pub polarization: PolarizationMode,
    #[serde(default)]
    pub sweep: Option<SweepSettings>,
}

impl Settings {
    pub fn stack(&self) -> FilmStack {
        FilmStack::new(
            self.incident_refr_index,
            self.film_refr_index,
            self.thickness,
            self.substrate_refr_index,
        )
    }

    /// The engine input, with the angle in radians.
    pub fn problem(&self) -> Problem {
        Problem::new(self.stack(), self.wavelength, self.angle.to_radians())
    }

    /// Checks the inputs the engine itself does not guard against.
    pub fn validate(&self) -> Result<()> {
        if !(self.thickness > 0.0) {
            bail!("Film thickness must be greater than 0, got {}", self.thickness);
        }
        if !(self.wavelength > 0.0) {
            bail!("Wavelength must be greater than 0, got {}", self.wavelength);
        }
        check_angle("Incidence angle", self.angle)?;
        if let Some(sweep) = &self.sweep {
            check_angle("Sweep start angle", sweep.start)?;
            check_angle("Sweep end angle", sweep.end)?;
        }
        Ok(())
    }

    /// Overrides file and environment values with those given on the command line.
    pub fn apply_args(&mut self, args: &CliArgs) {
        if let Some(n0) = args.n0 {
            self.incident_refr_index = n0;
        }
        if let Some(n1) = args.n1 {
            self.film_refr_index = n1;
        }
        if let Some(ns) = args.ns {
            self.substrate_refr_index = ns;
        }
        if let Some(thickness) = args.thickness {
            self.thickness = thickness;
        }
        if let Some(wavelength) = args.wavelength {
            self.wavelength = wavelength;
        }
        if let Some(angle) = args.angle {
            self.angle = angle;
        }
        if let Some(polarization) = args.polarization {
            self.polarization = polarization;
        }
        if let Some(range) = &args.sweep {
            let points = args
                .points
                .or(self.sweep.map(|s| s.points))
                .unwrap_or(DEFAULT_SWEEP_POINTS);
            self.sweep = Some(SweepSettings {
                start: range[0],
                end: range[1],
                points,
            });
        } else if let (Some(points), Some(sweep)) = (args.points, self.sweep.as_mut()) {
            sweep.points = points;
        }
    }
}

fn check_angle(what: &str, degrees: f64) -> Result<()> {
    if !(degrees.abs() < 90.0) {
        bail!("{} must lie strictly between -90° and 90°, got {}°", what, degrees);
    }
    Ok(())
}

/// Loads `config/default.toml` alone, ignoring local files, presets and the environment.
pub fn load_default_config() -> Result<Settings> {
    let root = retrieve_project_root()?;
    let default_config_file = root.join("config/default.toml");

    let settings: Settings = Config::builder()
        .add_source(File::from(default_config_file).required(true))
        .build()
        .context("Error loading configuration")?
        .try_deserialize()
        .context("Error deserializing configuration")?;

    settings.validate()?;
    Ok(settings)
}

/// Loads the layered configuration: `config/local.toml` if present (else
/// `config/default.toml`), then a preset if one was requested, then
/// `THINFILM_*` environment variables, then the command-line arguments.
pub fn load_config(args: &CliArgs) -> Result<Settings> {
    let root = retrieve_project_root()?;

    let default_config_file = root.join("config/default.toml");
    let local_config = root.join("config/local.toml");

    let config_file = if local_config.exists() {
        info!("Using local configuration: {:?}", local_config);
        local_config
    } else {
        info!("Using default configuration: {:?}", default_config_file);
        default_config_file
    };

    let mut builder = Config::builder().add_source(File::from(config_file).required(true));
    if let Some(preset) = &args.preset {
        let path = preset_path(&root, preset);
        info!("Using preset: {:?}", path);
        builder = builder.add_source(File::from(path).required(true));
    }

    let mut settings: Settings = builder
        .add_source(Environment::with_prefix("thinfilm"))
        .build()
        .context("Error loading configuration")?
        .try_deserialize()
        .context("Error deserializing configuration")?;

    settings.apply_args(args);
    settings.validate()?;

    debug!("{:#?}", settings);

    Ok(settings)
}

fn preset_path(root: &Path, name: &str) -> PathBuf {
    root.join("config/presets").join(format!("{}.toml", name.to_lowercase()))
}

/// Retrieve the project root directory.
/// This function tries to find the project root directory in different ways:
/// 1. If the CARGO_MANIFEST_DIR environment variable is set, use it.
/// 2. If the THINFILM_ROOT_DIR environment variable is set, use it.
/// 3. If the "config" subdirectory is found in the executable directory or any of its parents, use it.
pub fn retrieve_project_root() -> Result<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        // When running through cargo (e.g. cargo run, cargo test)
        return Ok(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var("THINFILM_ROOT_DIR") {
        return Ok(PathBuf::from(path));
    }

    let exe_path = env::current_exe().context("Failed to get current executable path")?;
    let mut current_dir = exe_path
        .parent()
        .context("Failed to get executable directory")?
        .to_path_buf();
    loop {
        if current_dir.join("config").is_dir() {
            return Ok(current_dir);
        }
        if !current_dir.pop() {
            bail!("Could not find project root directory; set THINFILM_ROOT_DIR");
        }
    }
}

#[derive(Parser, Debug, Default)]
#[command(
    version,
    about = "thinfilm - reflectance, transmittance and absorbance of a single thin film"
)]
pub struct CliArgs {
    /// Complex refractive index of the incident medium, e.g. `1.0`.
    #[arg(long, allow_hyphen_values = true)]
    pub n0: Option<Complex64>,

    /// Complex refractive index of the film, written n-ki, e.g. `2.385-0.1i`.
    #[arg(long, allow_hyphen_values = true)]
    pub n1: Option<Complex64>,

    /// Complex refractive index of the substrate.
    #[arg(long, allow_hyphen_values = true)]
    pub ns: Option<Complex64>,

    /// Film thickness in nanometres.
    #[arg(short = 'd', long)]
    pub thickness: Option<f64>,

    /// Wavelength in nanometres.
    #[arg(short, long)]
    pub wavelength: Option<f64>,

    /// Angle of incidence in degrees.
    #[arg(short, long, allow_hyphen_values = true)]
    pub angle: Option<f64>,

    /// Polarization of the incident light.
    #[arg(short, long, value_enum, ignore_case = true)]
    pub polarization: Option<PolarizationMode>,

    /// Sweep the angle of incidence from START to END degrees.
    #[arg(long, num_args = 2, value_names = ["START", "END"], allow_hyphen_values = true)]
    pub sweep: Option<Vec<f64>>,

    /// Number of angles in the sweep.
    #[arg(long)]
    pub points: Option<usize>,

    /// Name of a preset under `config/presets`, layered over the base configuration.
    #[arg(long)]
    pub preset: Option<String>,

    /// Run the built-in reference cases instead of a calculation.
    #[arg(long, conflicts_with = "sweep")]
    pub validate: bool,

    /// Emit results (and the trace tree) as JSON.
    #[arg(long)]
    pub json: bool,

    /// Print the summary only, without the calculation log.
    #[arg(short, long)]
    pub quiet: bool,
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Incident Medium Refractive Index: {}
  - Film Refractive Index: {}
  - Substrate Refractive Index: {}
  - Film Thickness: {:.2} nm
  - Wavelength: {:.2} nm
  - Incidence Angle: {:.2}°
  - Polarization: {}
",
            format_complex(self.incident_refr_index, COMPLEX_PRECISION),
            format_complex(self.film_refr_index, COMPLEX_PRECISION),
            format_complex(self.substrate_refr_index, COMPLEX_PRECISION),
            self.thickness,
            self.wavelength,
            self.angle,
            self.polarization.description(),
        )?;
        if let Some(sweep) = &self.sweep {
            writeln!(
                f,
                "  - Sweep: {:.2}° to {:.2}° over {} points",
                sweep.start, sweep.end, sweep.points
            )?;
        }
        Ok(())
    }
}
