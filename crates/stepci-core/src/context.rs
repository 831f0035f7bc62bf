use std::fmt;

use crate::{config::CompilerConfig, metrics::MetricsHandle};

/// Shared build context passed to the compiler, the advancer and the builder.
///
/// # Examples
/// ```
/// use stepci_core::{BuildContext, CompilerConfig};
///
/// let config = CompilerConfig {
///     unit_prefix: "ci-".into(),
///     ..CompilerConfig::default()
/// };
/// let ctx = BuildContext::default().with_config(config);
/// assert_eq!(ctx.config().unit_prefix, "ci-");
/// assert_eq!(ctx.to_string(), "BuildContext(prefix=ci-, platform=linux/amd64)");
/// ```
#[derive(Clone)]
pub struct BuildContext {
    config: CompilerConfig,
    metrics: MetricsHandle,
}

impl BuildContext {
    /// Create a new build context with the given params.
    pub fn new(config: CompilerConfig, metrics: MetricsHandle) -> Self {
        Self { config, metrics }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Get a clonable handle to the metrics backend.
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }

    /// Replace the compiler configuration and return updated context.
    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the metrics backend and return updated context.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self {
            config: CompilerConfig::default(),
            metrics: crate::metrics::noop_metrics(),
        }
    }
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("config", &self.config)
            .field("metrics", &"<handle>")
            .finish()
    }
}

impl fmt::Display for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BuildContext(prefix={}, platform={})",
            self.config.unit_prefix, self.config.platform
        )
    }
}
