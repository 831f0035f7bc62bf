use std::{fmt, sync::Arc};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use stepci_image::{ImageCommandCache, ImageResolver};
use stepci_model::Task;

use crate::{
    advancer::{Advance, SequenceAdvancer},
    compiler::TaskCompiler,
    context::BuildContext,
    error::CoreError,
    metrics::MetricsHandle,
    plane::ControlPlane,
};

/// Result of one [`TaskBuilder::build`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The unit did not exist and was created in state `0`.
    Created,
    /// The unit existed and was handed to the advancer.
    Sequenced(Advance),
}

impl BuildOutcome {
    /// Returns `true` if this call created the unit.
    pub fn created(&self) -> bool {
        matches!(self, BuildOutcome::Created)
    }

    /// Returns `true` if this call wrote anything.
    pub fn wrote(&self) -> bool {
        !matches!(self, BuildOutcome::Sequenced(Advance::Unchanged))
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildOutcome::Created => f.write_str("created"),
            BuildOutcome::Sequenced(Advance::Unchanged) => f.write_str("unchanged"),
            BuildOutcome::Sequenced(Advance::Started) => f.write_str("started"),
            BuildOutcome::Sequenced(Advance::Advanced { from, to }) => {
                write!(f, "advanced {from} -> {to}")
            }
            BuildOutcome::Sequenced(Advance::Failed { step, exit_code }) => {
                write!(f, "step {step} failed with exit code {exit_code}")
            }
        }
    }
}

/// Reconciliation entry point for tasks.
///
/// `build` is idempotent: call it on every change of a task or of its unit. The first
/// call creates the unit, later calls advance it one step at a time.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
/// use stepci_core::{BuildContext, MemoryControlPlane, TaskBuilder};
/// use stepci_image::{ImageCommandCache, RegistryConfig, RegistryResolver};
/// # async fn run(task: stepci_model::Task) -> Result<(), Box<dyn std::error::Error>> {
/// let ctx = BuildContext::default();
/// let resolver = RegistryResolver::new(ctx.config().platform.clone(), RegistryConfig::default())?;
/// let builder = TaskBuilder::new(
///     Arc::new(MemoryControlPlane::new()),
///     Arc::new(resolver),
///     Arc::new(ImageCommandCache::new(ctx.config().cache_capacity)?),
///     ctx,
/// );
/// let outcome = builder.build(&task, &CancellationToken::new()).await?;
/// println!("{outcome}");
/// # Ok(())
/// # }
/// ```
pub struct TaskBuilder {
    plane: Arc<dyn ControlPlane>,
    compiler: TaskCompiler,
    advancer: SequenceAdvancer,
    metrics: MetricsHandle,
}

impl TaskBuilder {
    pub fn new(
        plane: Arc<dyn ControlPlane>,
        resolver: Arc<dyn ImageResolver>,
        cache: Arc<ImageCommandCache>,
        ctx: BuildContext,
    ) -> Self {
        let advancer = SequenceAdvancer::new(plane.clone(), &ctx);
        let metrics = ctx.metrics().clone();
        Self {
            plane,
            compiler: TaskCompiler::new(ctx, resolver, cache),
            advancer,
            metrics,
        }
    }

    pub fn compiler(&self) -> &TaskCompiler {
        &self.compiler
    }

    /// Create the unit of `task` if missing, otherwise advance it.
    ///
    /// Errors are returned unchanged and never retried here; a conflict means another
    /// writer won and the caller should dispatch again with fresh state.
    #[instrument(level = "debug", skip_all, fields(task = %task.metadata.key()))]
    pub async fn build(
        &self,
        task: &Task,
        cancel: &CancellationToken,
    ) -> Result<BuildOutcome, CoreError> {
        let result = self.reconcile(task, cancel).await;
        if let Err(e) = &result {
            self.metrics.record_build_error(e.kind());
            debug!(error = %e, kind = e.kind(), "build failed");
        }
        result
    }

    async fn reconcile(
        &self,
        task: &Task,
        cancel: &CancellationToken,
    ) -> Result<BuildOutcome, CoreError> {
        let namespace = &task.metadata.namespace;
        let name = self.compiler.unit_name(task);

        match self.plane.get(namespace, &name).await {
            Ok(unit) => {
                let advance = self.advancer.advance(unit).await?;
                Ok(BuildOutcome::Sequenced(advance))
            }
            Err(e) if e.is_not_found() => {
                debug!(unit = %name, "unit not found, compiling");
                let unit = self.compiler.compile(task, cancel).await?;
                if cancel.is_cancelled() {
                    return Err(CoreError::Canceled);
                }

                let key = unit.metadata.key();
                self.plane
                    .create(&unit)
                    .await
                    .map_err(|source| CoreError::Create {
                        unit: key.clone(),
                        source,
                    })?;
                self.metrics.record_unit_created();
                info!(unit = %key, steps = unit.spec.containers.len(), "unit created");
                Ok(BuildOutcome::Created)
            }
            Err(source) => Err(CoreError::Lookup { unit: name, source }),
        }
    }
}
