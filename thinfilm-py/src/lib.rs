use num_complex::Complex64;
use pyo3::exceptions::{PyArithmeticError, PyValueError, PyZeroDivisionError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use thinfilm::error::MathError;
use thinfilm::film::FilmStack;
use thinfilm::problem::Problem;
use thinfilm::result::{OpticalResult, PolarizationMode};
use thinfilm::trace::{NullRecorder, Trace};
use thinfilm::validation;

fn to_py_err(err: MathError) -> PyErr {
    match err {
        MathError::DivisionByZero(_) => PyZeroDivisionError::new_err(err.to_string()),
        _ => PyArithmeticError::new_err(err.to_string()),
    }
}

fn parse_polarization(tag: &str) -> PyResult<PolarizationMode> {
    match tag.to_ascii_uppercase().as_str() {
        "S" => Ok(PolarizationMode::S),
        "P" => Ok(PolarizationMode::P),
        "AVG" => Ok(PolarizationMode::Avg),
        _ => Err(PyValueError::new_err(format!(
            "polarization must be 'S', 'P' or 'AVG', got '{}'",
            tag
        ))),
    }
}

fn result_dict<'py>(py: Python<'py>, result: &OpticalResult) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("reflectance", result.reflectance())?;
    dict.set_item("transmittance", result.transmittance())?;
    dict.set_item("absorbance", result.absorbance())?;
    dict.set_item(
        "reflection_coefficient",
        (result.reflection_coefficient.re, result.reflection_coefficient.im),
    )?;
    dict.set_item("wavelength", result.wavelength)?;
    dict.set_item("angle_deg", result.angle.to_degrees())?;
    dict.set_item("energy_conserved", result.energy_conserved)?;
    dict.set_item("polarization", result.polarization.to_string())?;
    if let (Some(s), Some(p)) = (result.s_result(), result.p_result()) {
        dict.set_item("s", result_dict(py, s)?)?;
        dict.set_item("p", result_dict(py, p)?)?;
    }
    Ok(dict)
}

/// Reflectance, transmittance and absorbance of a single film.
///
/// Indices follow N = n - ik. The angle is in degrees. With `trace=True`
/// the returned dict also holds the full calculation log under "log".
#[pyfunction]
#[pyo3(signature = (n0_re, n0_im, n1_re, n1_im, thickness, ns_re, ns_im, wavelength, angle_deg=0.0, polarization="S", trace=false))]
#[allow(clippy::too_many_arguments)]
fn compute<'py>(
    py: Python<'py>,
    n0_re: f64,
    n0_im: f64,
    n1_re: f64,
    n1_im: f64,
    thickness: f64,
    ns_re: f64,
    ns_im: f64,
    wavelength: f64,
    angle_deg: f64,
    polarization: &str,
    trace: bool,
) -> PyResult<Bound<'py, PyDict>> {
    let mode = parse_polarization(polarization)?;
    let problem = Problem::new(
        FilmStack::new(
            Complex64::new(n0_re, n0_im),
            Complex64::new(n1_re, n1_im),
            thickness,
            Complex64::new(ns_re, ns_im),
        ),
        wavelength,
        angle_deg.to_radians(),
    );

    if trace {
        let mut recorder = Trace::new();
        let result = problem
            .compute_with_polarization(mode, &mut recorder)
            .map_err(to_py_err)?;
        let dict = result_dict(py, &result)?;
        dict.set_item("log", recorder.full_log())?;
        Ok(dict)
    } else {
        let result = problem
            .compute_with_polarization(mode, &mut NullRecorder)
            .map_err(to_py_err)?;
        result_dict(py, &result)
    }
}

/// Runs the built-in reference cases and returns one dict per case.
#[pyfunction]
fn reference_suite<'py>(py: Python<'py>) -> PyResult<Bound<'py, PyList>> {
    let report = validation::run_reference_suite(&mut NullRecorder).map_err(to_py_err)?;
    let cases = PyList::empty(py);
    for case in &report.cases {
        let dict = PyDict::new(py);
        dict.set_item("name", &case.name)?;
        dict.set_item(
            "expected",
            (case.expected.reflectance, case.expected.transmittance, case.expected.absorbance),
        )?;
        dict.set_item(
            "computed",
            (case.computed.reflectance, case.computed.transmittance, case.computed.absorbance),
        )?;
        dict.set_item(
            "error",
            (case.error.reflectance, case.error.transmittance, case.error.absorbance),
        )?;
        dict.set_item("passed", case.passed)?;
        cases.append(dict)?;
    }
    Ok(cases)
}

#[pymodule]
fn _thinfilm_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(compute, m)?)?;
    m.add_function(wrap_pyfunction!(reference_suite, m)?)?;
    Ok(())
}
