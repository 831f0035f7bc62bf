use thiserror::Error;

use stepci_image::ImageError;
use stepci_model::ModelError;

use crate::plane::ControlPlaneError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid task: {0}")]
    Model(#[source] ModelError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("lookup of unit {unit} failed: {source}")]
    Lookup {
        unit: String,
        #[source]
        source: ControlPlaneError,
    },

    #[error("step {step}: {source}")]
    Reference {
        step: String,
        #[source]
        source: ImageError,
    },

    #[error("step {step}: resolving command of {image} failed: {source}")]
    Resolution {
        step: String,
        image: String,
        #[source]
        source: ImageError,
    },

    #[error("creating unit {unit} failed: {source}")]
    Create {
        unit: String,
        #[source]
        source: ControlPlaneError,
    },

    #[error("updating unit {unit} failed: {source}")]
    Update {
        unit: String,
        #[source]
        source: ControlPlaneError,
    },

    #[error("corrupt order annotation on unit {unit}: {source}")]
    Annotation {
        unit: String,
        #[source]
        source: ModelError,
    },

    #[error("build canceled")]
    Canceled,
}

impl CoreError {
    /// Returns `true` if a concurrent writer won; the caller should re-dispatch with a fresh read.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CoreError::Update {
                source: ControlPlaneError::Conflict { .. },
                ..
            } | CoreError::Create {
                source: ControlPlaneError::AlreadyExists(_),
                ..
            }
        )
    }

    /// Low-cardinality label used by metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Model(_) => "invalid_task",
            CoreError::Config(_) => "config",
            CoreError::Lookup { .. } => "lookup",
            CoreError::Reference { .. } => "reference",
            CoreError::Resolution { .. } => "resolution",
            CoreError::Create { .. } if self.is_conflict() => "conflict",
            CoreError::Create { .. } => "create",
            CoreError::Update { .. } if self.is_conflict() => "conflict",
            CoreError::Update { .. } => "update",
            CoreError::Annotation { .. } => "annotation",
            CoreError::Canceled => "canceled",
        }
    }
}
