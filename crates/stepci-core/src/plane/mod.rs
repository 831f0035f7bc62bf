//! Boundary to the orchestration control plane storing workload units.
use async_trait::async_trait;
use thiserror::Error;

use stepci_model::WorkloadUnit;

mod memory;
pub use memory::MemoryControlPlane;

/// Errors reported by a control plane.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlPlaneError {
    /// No unit with this key.
    #[error("unit {0} not found")]
    NotFound(String),

    /// Create raced with another writer.
    #[error("unit {0} already exists")]
    AlreadyExists(String),

    /// Update carried a stale resource version.
    #[error("unit {key} was modified: expected version {expected:?}, stored {actual}")]
    Conflict {
        key: String,
        expected: Option<String>,
        actual: String,
    },

    #[error("control plane error: {0}")]
    Other(String),
}

impl ControlPlaneError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ControlPlaneError::NotFound(_))
    }
}

/// Storage of workload units with optimistic concurrency.
///
/// Implementations must reject an `update` whose `metadata.resourceVersion` differs from
/// the stored one with [`ControlPlaneError::Conflict`], and assign a fresh version on
/// every accepted write.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Fetch the unit `namespace/name`.
    async fn get(&self, namespace: &str, name: &str) -> Result<WorkloadUnit, ControlPlaneError>;

    /// Store a new unit, returning it as persisted.
    async fn create(&self, unit: &WorkloadUnit) -> Result<WorkloadUnit, ControlPlaneError>;

    /// Replace metadata and spec of an existing unit, returning it as persisted.
    ///
    /// Status is owned by the control plane and never written through this call.
    async fn update(&self, unit: &WorkloadUnit) -> Result<WorkloadUnit, ControlPlaneError>;
}
