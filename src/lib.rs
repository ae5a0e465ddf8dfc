//! Reflectance, transmittance and absorbance of a single thin film.
//!
//! A film of complex refractive index `N = n - ik` and physical thickness
//! `d` lies between a semi-infinite incident medium and a semi-infinite
//! substrate. The [`problem`] module evaluates the stack with the optical
//! characteristic-matrix method and reports every intermediate quantity
//! through a [`trace::Recorder`], so that a calculation can be read back
//! step by step or run headless.
//!
//! ```
//! use num_complex::Complex64;
//! use thinfilm::film::FilmStack;
//! use thinfilm::problem::Problem;
//! use thinfilm::result::Polarization;
//! use thinfilm::trace::Trace;
//!
//! let stack = FilmStack::new(
//!     Complex64::new(1.0, 0.0),
//!     Complex64::new(2.385, -0.1),
//!     99.45,
//!     Complex64::new(1.52, 0.0),
//! );
//! let mut trace = Trace::new();
//! let result = Problem::new(stack, 550.0, 0.0)
//!     .compute(Polarization::S, &mut trace)
//!     .unwrap();
//! assert!((result.reflectance() - 0.1115).abs() < 1e-3);
//! assert!(result.energy_conserved);
//! ```

pub mod admittance;
pub mod complex;
pub mod config;
pub mod error;
pub mod film;
pub mod fresnel;
pub mod matrix;
pub mod output;
pub mod powers;
pub mod problem;
pub mod result;
pub mod settings;
pub mod snell;
pub mod step;
pub mod sweep;
pub mod trace;
pub mod validation;
