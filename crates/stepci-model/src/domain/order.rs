use std::fmt;

use crate::{
    Annotations,
    domain::constants::{ANNOTATION_TASK_ORDER, ORDER_FAILED, ORDER_NOT_STARTED},
    error::{ModelError, ModelResult},
};

/// Typed value of the order annotation.
///
/// Persisted as a string-encoded integer with domain `{-1, 0, 1..=N}` where `N` is
/// the number of steps:
/// - `0`  : [`TaskOrder::NotStarted`], the unit exists but no gate is open;
/// - `k`  : [`TaskOrder::Step`], step `k` (1-based) holds the gate; `k == N` means
///   every step has been released and the last one is the only one left to finish;
/// - `-1` : [`TaskOrder::Failed`], a step exited non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOrder {
    NotStarted,
    Step(usize),
    Failed,
}

impl TaskOrder {
    /// Parse a raw annotation value for a unit with `steps` steps.
    ///
    /// Anything outside the domain is rejected, never clamped.
    pub fn parse(raw: &str, steps: usize) -> ModelResult<Self> {
        let invalid = |reason: String| ModelError::InvalidOrder {
            value: raw.to_string(),
            reason,
        };
        match raw {
            ORDER_NOT_STARTED => Ok(TaskOrder::NotStarted),
            ORDER_FAILED => Ok(TaskOrder::Failed),
            other => {
                let n: i64 = other
                    .parse()
                    .map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
                if n < 1 || n as u64 > steps as u64 {
                    return Err(invalid(format!("outside of 0..={steps} and -1")));
                }
                Ok(TaskOrder::Step(n as usize))
            }
        }
    }

    /// Read and parse the order annotation.
    pub fn from_annotations(annotations: &Annotations, steps: usize) -> ModelResult<Self> {
        let raw = annotations
            .get(ANNOTATION_TASK_ORDER)
            .ok_or(ModelError::MissingAnnotation(ANNOTATION_TASK_ORDER))?;
        Self::parse(raw, steps)
    }

    /// Returns `true` once the last step holds the gate.
    pub fn is_last(&self, steps: usize) -> bool {
        matches!(self, TaskOrder::Step(k) if *k == steps)
    }
}

impl fmt::Display for TaskOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOrder::NotStarted => f.write_str(ORDER_NOT_STARTED),
            TaskOrder::Step(k) => write!(f, "{k}"),
            TaskOrder::Failed => f.write_str(ORDER_FAILED),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_domain() {
        assert_eq!(TaskOrder::parse("0", 3).unwrap(), TaskOrder::NotStarted);
        assert_eq!(TaskOrder::parse("-1", 3).unwrap(), TaskOrder::Failed);
        for k in 1..=3 {
            assert_eq!(
                TaskOrder::parse(&k.to_string(), 3).unwrap(),
                TaskOrder::Step(k)
            );
        }
    }

    #[test]
    fn rejects_values_outside_domain() {
        let bad = ["4", "-2", "", "one", "1.5", " 1"];
        for raw in bad {
            let parsed = TaskOrder::parse(raw, 3);
            assert!(
                matches!(parsed, Err(ModelError::InvalidOrder { .. })),
                "expected InvalidOrder for {raw:?}, got {parsed:?}"
            );
        }
    }

    #[test]
    fn display_matches_persisted_form() {
        assert_eq!(TaskOrder::NotStarted.to_string(), "0");
        assert_eq!(TaskOrder::Step(7).to_string(), "7");
        assert_eq!(TaskOrder::Failed.to_string(), "-1");
    }

    #[test]
    fn missing_annotation_is_reported() {
        let err = TaskOrder::from_annotations(&Annotations::new(), 2).unwrap_err();
        assert!(matches!(err, ModelError::MissingAnnotation(ANNOTATION_TASK_ORDER)));
    }

    #[test]
    fn last_step_detection() {
        assert!(TaskOrder::Step(2).is_last(2));
        assert!(!TaskOrder::Step(1).is_last(2));
        assert!(!TaskOrder::Failed.is_last(2));
    }
}
