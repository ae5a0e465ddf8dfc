//! Nodes of the calculation trace.
//!
//! A trace is a tree of [`CalculationStep`]s, each holding an ordered list
//! of named [`CalculationResult`]s. Steps are stored in an arena owned by
//! [`crate::trace::Trace`] and refer to each other by [`StepId`]; the
//! `parent` link is for upward navigation only.

use chrono::{DateTime, Local, TimeDelta};
use num_complex::Complex64;
use serde::Serialize;

use crate::complex::format_complex;
use crate::config::{COMPLEX_PRECISION, SCALAR_PRECISION};
use crate::matrix::ComplexMatrix;


/// Index of a step inside its trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StepId(pub usize);

/// What a step computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepKind {
    Header,
    InputParameters,
    PhaseThickness,
    OpticalAdmittance,
    CharacteristicMatrix,
    BoundaryCondition,
    ReflectionTransmission,
    TraCalculation,
    Validation,
    Comparison,
    FinalResults,
}

/// Lifecycle of a step: `Pending` until opened, `Running` while open,
/// then `Completed` or `Failed` once closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Warning,
}

/// The value of a named intermediate result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ResultValue {
    Scalar(f64),
    Complex(Complex64),
    Matrix(ComplexMatrix),
    Text(String),
}

impl ResultValue {
    /// Short rendering for tree views. Matrices are summarised by shape.
    pub fn formatted(&self) -> String {
        match self {
            ResultValue::Scalar(x) => format!("{:.*}", SCALAR_PRECISION, x),
            ResultValue::Complex(z) => format_complex(*z, COMPLEX_PRECISION),
            ResultValue::Matrix(m) => format!("[{}×{} Matrix]", m.rows(), m.cols()),
            ResultValue::Text(s) => s.clone(),
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ResultValue::Scalar(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<Complex64> {
        match self {
            ResultValue::Complex(z) => Some(*z),
            ResultValue::Scalar(x) => Some(Complex64::new(*x, 0.0)),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&ComplexMatrix> {
        match self {
            ResultValue::Matrix(m) => Some(m),
            _ => None,
        }
    }
}

impl From<f64> for ResultValue {
    fn from(value: f64) -> Self {
        ResultValue::Scalar(value)
    }
}

impl From<Complex64> for ResultValue {
    fn from(value: Complex64) -> Self {
        ResultValue::Complex(value)
    }
}

impl From<ComplexMatrix> for ResultValue {
    fn from(value: ComplexMatrix) -> Self {
        ResultValue::Matrix(value)
    }
}

impl From<String> for ResultValue {
    fn from(value: String) -> Self {
        ResultValue::Text(value)
    }
}

impl From<&str> for ResultValue {
    fn from(value: &str) -> Self {
        ResultValue::Text(value.to_string())
    }
}

/// A named value recorded in a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult {
    pub name: String,
    pub value: ResultValue,
    pub unit: String,
    pub formula: String,
    /// The step this result belongs to.
    pub step: StepId,
}

/// A node in the calculation trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationStep {
    pub id: StepId,
    pub title: String,
    pub kind: StepKind,
    pub status: StepStatus,
    pub results: Vec<CalculationResult>,
    pub children: Vec<StepId>,
    pub parent: Option<StepId>,
    pub started_at: Option<DateTime<Local>>,
    pub ended_at: Option<DateTime<Local>>,
    pub progress: Option<f64>,
}

impl CalculationStep {
    pub fn new(id: StepId, title: &str, kind: StepKind, parent: Option<StepId>) -> Self {
        Self {
            id,
            title: title.to_string(),
            kind,
            status: StepStatus::Pending,
            results: Vec::new(),
            children: Vec::new(),
            parent,
            started_at: None,
            ended_at: None,
            progress: None,
        }
    }

    /// Moves the step to `status`, stamping the start time on `Running`
    /// and the end time and progress on `Completed`/`Failed`.
    pub fn update_status(&mut self, status: StepStatus) {
        self.status = status;
        match status {
            StepStatus::Running => self.started_at = Some(Local::now()),
            StepStatus::Completed => {
                self.ended_at = Some(Local::now());
                self.progress = Some(100.0);
            }
            StepStatus::Failed => {
                self.ended_at = Some(Local::now());
                self.progress = Some(0.0);
            }
            StepStatus::Pending | StepStatus::Warning => {}
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, StepStatus::Completed | StepStatus::Failed)
    }

    /// Wall-clock time between opening and closing, once both are known.
    pub fn duration(&self) -> Option<TimeDelta> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some(end.signed_duration_since(start)),
            _ => None,
        }
    }

    pub fn push_result(&mut self, name: &str, value: ResultValue, unit: &str, formula: &str) {
        self.results.push(CalculationResult {
            name: name.to_string(),
            value,
            unit: unit.to_string(),
            formula: formula.to_string(),
            step: self.id,
        });
    }

    /// First result recorded under `name`.
    pub fn result(&self, name: &str) -> Option<&CalculationResult> {
        self.results.iter().find(|r| r.name == name)
    }
}
