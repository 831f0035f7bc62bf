//! Well-known keys and sentinel values of the sequencing protocol.
//!
//! The order annotation is the single piece of state shared between the
//! controller (writer) and every step container (reader, via a projected file).

/// Annotation key holding the current step gate of a workload unit.
///
/// Its value is projected into every container as a file and polled by the helper binary.
pub const ANNOTATION_TASK_ORDER: &str = "taskorder";

/// Order value of a freshly created unit: no step may run yet.
pub const ORDER_NOT_STARTED: &str = "0";

/// Order value recorded once any step exits non-zero. Sticky.
pub const ORDER_FAILED: &str = "-1";
