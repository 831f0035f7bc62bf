//! Metrics collection abstraction for task builds.
//!
//! Backends (prometheus, ...) implement [`MetricsBackend`] and are injected via [`crate::BuildContext`].
mod backend;
pub use backend::{ImageLookup, MetricsBackend, MetricsHandle};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
