use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("invalid image reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("invalid platform {0:?} (expected os/arch[/variant])")]
    InvalidPlatform(String),

    #[error("image {reference} has no configuration for platform {platform}")]
    PlatformNotFound { reference: String, platform: String },

    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("registry returned {status} for {url}")]
    Registry { status: u16, url: String },

    #[error("registry authentication failed: {0}")]
    Unauthorized(String),

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("cache capacity must be greater than zero")]
    ZeroCapacity,
}
