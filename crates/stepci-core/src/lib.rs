pub mod advancer;
pub mod builder;
pub mod compiler;
pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod plane;

#[cfg(test)]
pub(crate) mod testing;

pub use advancer::{Advance, SequenceAdvancer};
pub use builder::{BuildOutcome, TaskBuilder};
pub use compiler::TaskCompiler;
pub use config::CompilerConfig;
pub use context::BuildContext;
pub use error::CoreError;
pub use metrics::{ImageLookup, MetricsBackend, MetricsHandle, NoOpMetrics, noop_metrics};
pub use plane::{ControlPlane, ControlPlaneError, MemoryControlPlane};

pub mod prelude {
    pub use crate::builder::{BuildOutcome, TaskBuilder};
    pub use crate::context::BuildContext;
    pub use crate::error::CoreError;
    pub use crate::plane::{ControlPlane, ControlPlaneError};
}
