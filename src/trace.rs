//! Recording of intermediate results.
//!
//! The optics engine reports what it computes through the [`Recorder`]
//! trait, which it receives as an explicit argument. Two recorders are
//! provided:
//! - [`Trace`], which keeps a step tree and an aligned plain-text log
//! - [`NullRecorder`], which discards everything for headless runs
//!
//! Both projections of a [`Trace`] are built from the same calls, so every
//! recorded value appears once in the text log and once in the tree.
//!
//! Steps nest under whichever step is currently open. Closing a step makes
//! its parent current again, so consecutive steps opened at the same level
//! become siblings.

use std::fmt::Display;

use log::{debug, warn};
use num_complex::Complex64;
use serde::Serialize;

use crate::complex::format_complex;
use crate::config::{COMPLEX_PRECISION, LABEL_WIDTH, SCALAR_PRECISION};
use crate::matrix::ComplexMatrix;
use crate::step::{CalculationStep, ResultValue, StepId, StepKind, StepStatus};

const SEPARATOR: &str = "============================================================";
const LINE: &str = "----------------------------------------";


/// A sink for the intermediate results of a calculation.
pub trait Recorder {
    /// Opens the session root, or closes whatever is open and makes the
    /// existing root current again.
    fn header(&mut self, title: &str);
    /// Opens a step under the current step, or under the root if nothing is open.
    fn open_step(&mut self, title: &str, kind: StepKind);
    /// Appends a named value, with optional unit and formula, to the current step,
    /// or to the root once every step is closed.
    fn record_with(&mut self, name: &str, value: ResultValue, unit: &str, formula: &str);
    /// Appends a free-form line to the text log only.
    fn note(&mut self, line: &str);
    /// Marks the current step `Completed` and returns to its parent.
    fn complete_step(&mut self);
    /// Marks the current step `Failed` and returns to its parent.
    fn fail_step(&mut self);
    /// Marks every step that is still running as `Completed`.
    fn complete_session(&mut self);

    fn record(&mut self, name: &str, value: ResultValue) {
        self.record_with(name, value, "", "");
    }

    fn scalar(&mut self, name: &str, value: f64) {
        self.record(name, ResultValue::Scalar(value));
    }

    fn complex(&mut self, name: &str, value: Complex64) {
        self.record(name, ResultValue::Complex(value));
    }

    fn matrix(&mut self, name: &str, value: &ComplexMatrix) {
        self.record(name, ResultValue::Matrix(value.clone()));
    }

    fn text(&mut self, name: &str, value: &str) {
        self.record(name, ResultValue::Text(value.to_string()));
    }
}

/// Runs `f` inside a step titled `title`, completing the step on success
/// and failing it on error. Either way the parent is current afterwards.
pub fn scoped_step<R, T, E, F>(rec: &mut R, title: &str, kind: StepKind, f: F) -> Result<T, E>
where
    R: Recorder + ?Sized,
    E: Display,
    F: FnOnce(&mut R) -> Result<T, E>,
{
    debug!("step started: {}", title);
    rec.open_step(title, kind);
    match f(rec) {
        Ok(value) => {
            rec.complete_step();
            debug!("step completed: {}", title);
            Ok(value)
        }
        Err(err) => {
            rec.fail_step();
            warn!("step failed: {}: {}", title, err);
            Err(err)
        }
    }
}

/// Discards everything. Use it when only the numbers matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn header(&mut self, _title: &str) {}
    fn open_step(&mut self, _title: &str, _kind: StepKind) {}
    fn record_with(&mut self, _name: &str, _value: ResultValue, _unit: &str, _formula: &str) {}
    fn note(&mut self, _line: &str) {}
    fn complete_step(&mut self) {}
    fn fail_step(&mut self) {}
    fn complete_session(&mut self) {}
}

/// Append-only record of one calculation session.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    steps: Vec<CalculationStep>,
    root: Option<StepId>,
    current: Option<StepId>,
    log: String,
}

/// A step together with its nested sub-steps, for serialisation.
#[derive(Debug, Serialize)]
pub struct StepTree<'a> {
    #[serde(flatten)]
    pub step: &'a CalculationStep,
    pub substeps: Vec<StepTree<'a>>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<StepId> {
        self.root
    }

    pub fn root_step(&self) -> Option<&CalculationStep> {
        self.root.map(|id| &self.steps[id.0])
    }

    /// The step new results are attached to.
    pub fn current(&self) -> Option<StepId> {
        self.current
    }

    pub fn step(&self, id: StepId) -> Option<&CalculationStep> {
        self.steps.get(id.0)
    }

    /// Every step in creation order.
    pub fn steps(&self) -> &[CalculationStep] {
        &self.steps
    }

    pub fn children(&self, id: StepId) -> impl Iterator<Item = &CalculationStep> + '_ {
        self.step(id)
            .into_iter()
            .flat_map(|step| step.children.iter())
            .map(|child| &self.steps[child.0])
    }

    pub fn parent(&self, id: StepId) -> Option<&CalculationStep> {
        self.step(id)?.parent.and_then(|parent| self.step(parent))
    }

    /// First step with the given title, in creation order.
    pub fn find(&self, title: &str) -> Option<&CalculationStep> {
        self.steps.iter().find(|s| s.title == title)
    }

    /// Depth-first walk from the root, paired with each step's depth.
    pub fn walk(&self) -> Vec<(usize, &CalculationStep)> {
        let mut out = Vec::with_capacity(self.steps.len());
        let mut stack: Vec<(usize, StepId)> = self.root.map(|r| (0, r)).into_iter().collect();
        while let Some((depth, id)) = stack.pop() {
            let step = &self.steps[id.0];
            out.push((depth, step));
            stack.extend(step.children.iter().rev().map(|c| (depth + 1, *c)));
        }
        out
    }

    /// The step tree rooted at the session root.
    pub fn tree(&self) -> Option<StepTree<'_>> {
        self.root.map(|root| self.subtree(root))
    }

    /// The flat, human-readable log.
    pub fn full_log(&self) -> &str {
        &self.log
    }

    /// Discards the whole tree and the text log.
    pub fn clear(&mut self) {
        self.steps.clear();
        self.log.clear();
        self.root = None;
        self.current = None;
    }

    fn subtree(&self, id: StepId) -> StepTree<'_> {
        let step = &self.steps[id.0];
        StepTree {
            step,
            substeps: step.children.iter().map(|c| self.subtree(*c)).collect(),
        }
    }

    fn push_step(&mut self, title: &str, kind: StepKind, parent: Option<StepId>) -> StepId {
        let id = StepId(self.steps.len());
        let mut step = CalculationStep::new(id, title, kind, parent);
        step.update_status(StepStatus::Running);
        self.steps.push(step);
        if let Some(parent) = parent {
            self.steps[parent.0].children.push(id);
        }
        id
    }

    fn close_current(&mut self, status: StepStatus) {
        if let Some(id) = self.current {
            let step = &mut self.steps[id.0];
            step.update_status(status);
            self.current = step.parent;
        }
    }

    fn log_line(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }
}

impl Recorder for Trace {
    fn header(&mut self, title: &str) {
        self.log_line(SEPARATOR);
        self.log_line(&format!("  {}", title));
        self.log_line(SEPARATOR);
        self.log_line("");

        match self.root {
            Some(root) => {
                while self.current.is_some_and(|id| id != root) {
                    self.close_current(StepStatus::Completed);
                }
                let step = &mut self.steps[root.0];
                if step.status != StepStatus::Running {
                    step.update_status(StepStatus::Running);
                }
                self.current = Some(root);
            }
            None => {
                let root = self.push_step(title, StepKind::Header, None);
                self.root = Some(root);
                self.current = Some(root);
            }
        }
    }

    fn open_step(&mut self, title: &str, kind: StepKind) {
        self.log_line(LINE);
        self.log_line(&format!("{}:", title));
        self.log_line(LINE);

        let parent = self.current.or(self.root);
        let id = self.push_step(title, kind, parent);
        if self.root.is_none() {
            self.root = Some(id);
        }
        self.current = Some(id);
    }

    fn record_with(&mut self, name: &str, value: ResultValue, unit: &str, formula: &str) {
        let line = match &value {
            ResultValue::Scalar(x) => {
                format!("{:<w$} = {:.*}", name, SCALAR_PRECISION, x, w = LABEL_WIDTH)
            }
            ResultValue::Complex(z) => format!(
                "{:<w$} = {}",
                name,
                format_complex(*z, COMPLEX_PRECISION),
                w = LABEL_WIDTH
            ),
            ResultValue::Matrix(m) => format!("{}:\n{}", name, m.format_table()),
            ResultValue::Text(s) => format!("{:<w$} = {}", name, s, w = LABEL_WIDTH),
        };
        match self.current.or(self.root) {
            Some(id) => {
                self.log_line(&line);
                self.steps[id.0].push_result(name, value, unit, formula);
            }
            None => debug!("no step to record {} into", name),
        }
    }

    fn note(&mut self, line: &str) {
        self.log_line(line);
    }

    fn complete_step(&mut self) {
        self.close_current(StepStatus::Completed);
    }

    fn fail_step(&mut self) {
        self.close_current(StepStatus::Failed);
    }

    fn complete_session(&mut self) {
        while self.current.is_some() {
            self.close_current(StepStatus::Completed);
        }
        for step in self.steps.iter_mut().filter(|s| !s.is_terminal()) {
            step.update_status(StepStatus::Completed);
        }
    }
}
