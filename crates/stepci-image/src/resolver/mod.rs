//! Registry-backed resolution of image default commands.
mod auth;
mod manifest;

mod registry;
pub use registry::RegistryResolver;

use async_trait::async_trait;

use crate::{ImageCommandEntry, ImageError, ImageReference};

/// Source of image default commands.
///
/// Implementations hold no cache: the same reference always costs one lookup.
/// Callers put an [`crate::ImageCommandCache`] in front.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    /// Resolver name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Fetch the default command of `reference` for the resolver's target platform.
    ///
    /// Fails with [`ImageError::PlatformNotFound`] if the image was not built for it.
    async fn resolve(&self, reference: &ImageReference) -> Result<ImageCommandEntry, ImageError>;
}
