use std::sync::Arc;

use stepci_model::TaskOrder;

/// Result of an image command cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLookup {
    /// Served from the cache.
    Hit,
    /// Resolved from the registry.
    Miss,
}

impl ImageLookup {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            ImageLookup::Hit => "hit",
            ImageLookup::Miss => "miss",
        }
    }
}

/// Backend metrics collection interface.
///
/// Implementations are injected via [`crate::BuildContext`] and shared by the compiler,
/// the advancer and the builder.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record creation of a workload unit.
    fn record_unit_created(&self);

    /// Record a persisted change of the order annotation.
    ///
    /// # Arguments
    /// - `from`: order read from the unit
    /// - `to`: order written back
    fn record_transition(&self, from: TaskOrder, to: TaskOrder);

    /// Record an image command lookup for a step without explicit command.
    fn record_image_lookup(&self, lookup: ImageLookup);

    /// Record a failed build.
    ///
    /// # Arguments
    /// - `error_kind`: low-cardinality category, see [`crate::CoreError::kind`]
    fn record_build_error(&self, error_kind: &str);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
