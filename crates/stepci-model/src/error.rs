use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("missing annotation: {0}")]
    MissingAnnotation(&'static str),

    #[error("invalid order annotation {value:?}: {reason}")]
    InvalidOrder { value: String, reason: String },

    #[error("unknown restart policy: {0}")]
    UnknownRestart(String),

    #[error("unknown pull policy: {0}")]
    UnknownPullPolicy(String),

    #[error("unknown unit phase: {0}")]
    UnknownPhase(String),

    #[error("invalid model: {0}")]
    Invalid(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
