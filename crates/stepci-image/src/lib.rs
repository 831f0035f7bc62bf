//! Image command resolution for step containers.
//!
//! Steps that do not declare a command inherit the default entrypoint of their image.
//! This crate parses image references, fetches image configuration from OCI registries
//! and keeps the results in a bounded, process-wide LRU cache.
mod error;
pub use error::ImageError;

mod reference;
pub use reference::{DEFAULT_REGISTRY, ImageReference};

mod platform;
pub use platform::Platform;

mod command;
pub use command::{ImageCommand, ImageCommandEntry};

mod cache;
pub use cache::{DEFAULT_CACHE_CAPACITY, ImageCommandCache};

mod config;
pub use config::RegistryConfig;

mod resolver;
pub use resolver::{ImageResolver, RegistryResolver};
