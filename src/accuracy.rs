//! Transform accuracy self-test.
//!
//! Runs a set of logical positions through the sub-pixel transform and compares the
//! result against the caller's expected device coordinate. With no cases supplied,
//! two reference logo placements are checked against the naive `input * scale`
//! mapping for the current viewport.

#[cfg(test)]
#[path = "accuracy_test.rs"]
mod accuracy_test;

use serde::{Deserialize, Serialize};

use crate::transform::{Rounding, TransformEngine};
use crate::viewport::{Point, Viewport};

/// Logical input position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalInput {
    pub left: f64,
    pub top: f64,
}

/// One accuracy check: where `input` should land in device space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyCase {
    #[serde(default)]
    pub name: Option<String>,
    pub input: LogicalInput,
    pub expected: Point,
}

/// Outcome of one [`AccuracyCase`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyCaseResult {
    pub name: String,
    pub passed: bool,
    pub error_px: f64,
    pub delta: Point,
    pub input: LogicalInput,
    pub expected: Point,
    pub actual: Point,
}

/// Aggregate of an accuracy run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyReport {
    pub passed: usize,
    pub failed: usize,
    pub tolerance: f64,
    pub details: Vec<AccuracyCaseResult>,
}

impl AccuracyReport {
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Reference placements taken from a production order, mapped naively.
#[must_use]
pub fn default_cases(viewport: &Viewport) -> Vec<AccuracyCase> {
    [("ylife logo", 326.0, 150.0), ("yprint logo", 406.39, 116.49)]
        .into_iter()
        .map(|(name, left, top)| AccuracyCase {
            name: Some(name.to_owned()),
            input: LogicalInput { left, top },
            expected: viewport.logical_to_display(Point::new(left, top)),
        })
        .collect()
}

/// Run `cases` (or [`default_cases`] when empty). A case passes when its euclidean
/// error is at most the engine tolerance.
#[must_use]
pub fn run(engine: &TransformEngine, viewport: &Viewport, cases: &[AccuracyCase]) -> AccuracyReport {
    let defaults;
    let cases = if cases.is_empty() {
        defaults = default_cases(viewport);
        defaults.as_slice()
    } else {
        cases
    };

    let tolerance = engine.tolerance();
    let details: Vec<AccuracyCaseResult> = cases
        .iter()
        .enumerate()
        .map(|(index, case)| {
            let actual = engine
                .device_coordinates(case.input.left, case.input.top, viewport, Rounding::SubPixel)
                .point();
            let check = engine.validate_accuracy(actual, case.expected, Some(tolerance));
            AccuracyCaseResult {
                name: case.name.clone().unwrap_or_else(|| format!("Test {}", index + 1)),
                passed: check.error_px <= tolerance,
                error_px: check.error_px,
                delta: check.delta,
                input: case.input,
                expected: case.expected,
                actual,
            }
        })
        .collect();

    let passed = details.iter().filter(|d| d.passed).count();
    AccuracyReport { passed, failed: details.len() - passed, tolerance, details }
}
