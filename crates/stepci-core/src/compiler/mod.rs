//! Compilation of a [`Task`] into a [`WorkloadUnit`].
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

use stepci_image::{ImageCommand, ImageCommandCache, ImageCommandEntry, ImageError, ImageReference, ImageResolver};
use stepci_model::{ObjectMeta, RestartPolicy, Step, Task, TaskOrder, UnitSpec, WorkloadUnit};

use crate::{
    context::BuildContext,
    error::CoreError,
    metrics::ImageLookup,
};

mod layout;
pub use layout::{HELPER_VOLUME, PODINFO_VOLUME};

/// Turns tasks into workload units.
///
/// Steps without an explicit command get the default process of their image, looked up
/// in the shared [`ImageCommandCache`] and, on miss, fetched through the resolver.
pub struct TaskCompiler {
    ctx: BuildContext,
    resolver: Arc<dyn ImageResolver>,
    cache: Arc<ImageCommandCache>,
}

impl TaskCompiler {
    pub fn new(
        ctx: BuildContext,
        resolver: Arc<dyn ImageResolver>,
        cache: Arc<ImageCommandCache>,
    ) -> Self {
        Self {
            ctx,
            resolver,
            cache,
        }
    }

    /// Name of the unit owned by `task`; a pure function of the task name.
    pub fn unit_name(&self, task: &Task) -> String {
        format!("{}{}", self.ctx.config().unit_prefix, task.metadata.name)
    }

    /// Compile `task` into a unit ready to be created.
    ///
    /// The unit starts in [`TaskOrder::NotStarted`] with restart policy `Never`.
    /// Resolution of any step failing aborts the whole compilation.
    #[instrument(level = "debug", skip_all, fields(task = %task.metadata.key()))]
    pub async fn compile(
        &self,
        task: &Task,
        cancel: &CancellationToken,
    ) -> Result<WorkloadUnit, CoreError> {
        task.validate().map_err(CoreError::Model)?;
        let owner = task.owner_reference().map_err(CoreError::Model)?;
        let config = self.ctx.config();
        let name = self.unit_name(task);

        let mut containers = Vec::with_capacity(task.step_count());
        for (index, step) in task.spec.steps.iter().enumerate() {
            let launch = self.launch_command(index, step, cancel).await?;
            trace!(step = index + 1, command = ?launch.command, args = ?launch.args, "step command");
            containers.push(layout::step_container(config, index, step, launch));
        }

        let mut unit = WorkloadUnit {
            metadata: ObjectMeta {
                name: name.clone(),
                namespace: task.metadata.namespace.clone(),
                owner_references: vec![owner],
                ..Default::default()
            },
            spec: UnitSpec {
                init_containers: vec![layout::init_container(config, &name)],
                containers,
                volumes: layout::volumes(config),
                restart_policy: RestartPolicy::Never,
            },
            status: Default::default(),
        };
        unit.set_order(TaskOrder::NotStarted);

        debug!(unit = %unit.metadata.key(), steps = task.step_count(), "task compiled");
        Ok(unit)
    }

    /// Process the helper launches once the gate of `step` opens.
    async fn launch_command(
        &self,
        index: usize,
        step: &Step,
        cancel: &CancellationToken,
    ) -> Result<ImageCommand, CoreError> {
        if !step.needs_resolution() {
            return Ok(ImageCommand {
                command: step.command.clone(),
                args: step.args.clone(),
            });
        }

        let step_name = step.container_name(index);
        let reference =
            ImageReference::parse(&step.image).map_err(|source| CoreError::Reference {
                step: step_name.clone(),
                source,
            })?;
        let entry = self.lookup(&step_name, &reference, cancel).await?;

        let platform = &self.ctx.config().platform;
        let resolution_error = |source| CoreError::Resolution {
            step: step_name.clone(),
            image: reference.to_string(),
            source,
        };
        let image = entry.for_platform(platform).ok_or_else(|| {
            resolution_error(ImageError::PlatformNotFound {
                reference: reference.to_string(),
                platform: platform.to_string(),
            })
        })?;
        if image.command.is_empty() {
            return Err(resolution_error(ImageError::InvalidManifest(
                "image declares neither Entrypoint nor Cmd".into(),
            )));
        }

        let args = if step.args.is_empty() {
            image.args.clone()
        } else {
            step.args.clone()
        };
        Ok(ImageCommand {
            command: image.command.clone(),
            args,
        })
    }

    /// Cache-first lookup. A miss costs exactly one resolver call, raced against `cancel`.
    async fn lookup(
        &self,
        step: &str,
        reference: &ImageReference,
        cancel: &CancellationToken,
    ) -> Result<ImageCommandEntry, CoreError> {
        let metrics = self.ctx.metrics();
        if let Some(entry) = self.cache.get(reference) {
            metrics.record_image_lookup(ImageLookup::Hit);
            debug!(step, image = %reference, "image command cache hit");
            return Ok(entry);
        }
        metrics.record_image_lookup(ImageLookup::Miss);
        debug!(step, image = %reference, resolver = self.resolver.name(), "resolving image command");

        let entry = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CoreError::Canceled),
            resolved = self.resolver.resolve(reference) => {
                resolved.map_err(|source| CoreError::Resolution {
                    step: step.to_string(),
                    image: reference.to_string(),
                    source,
                })?
            }
        };

        self.cache.add(reference.clone(), entry.clone());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingResolver, explicit, task};
    use stepci_model::{ModelError, PullPolicy};

    fn compiler(resolver: Arc<CountingResolver>) -> TaskCompiler {
        TaskCompiler::new(
            BuildContext::default(),
            resolver,
            Arc::new(ImageCommandCache::default()),
        )
    }

    #[tokio::test]
    async fn compiles_one_container_per_step() {
        let resolver = Arc::new(CountingResolver::new());
        let c = compiler(resolver.clone());
        let t = task(
            "build",
            vec![
                explicit("alpine", &["echo", "one"]),
                explicit("alpine", &["echo", "two"]),
                explicit("busybox", &["true"]),
            ],
        );

        let unit = c.compile(&t, &CancellationToken::new()).await.unwrap();

        assert_eq!(unit.metadata.name, "task-pod-build");
        assert_eq!(unit.metadata.namespace, "ci");
        assert_eq!(unit.raw_order(), Some("0"));
        assert_eq!(unit.spec.restart_policy, RestartPolicy::Never);
        assert_eq!(unit.spec.init_containers.len(), 1);
        assert_eq!(unit.spec.containers.len(), 3);
        assert_eq!(unit.spec.volumes.len(), 2);
        for (i, container) in unit.spec.containers.iter().enumerate() {
            assert_eq!(container.name, format!("step-{}", i + 1));
            assert_eq!(container.args[3], (i + 1).to_string());
            assert_eq!(container.image_pull_policy, Some(PullPolicy::IfNotPresent));
        }
        assert_eq!(unit.spec.containers[0].args[7], "echo one");

        let owner = &unit.metadata.owner_references[0];
        assert_eq!(owner.name, "build");
        assert_eq!(owner.kind, "Task");
        assert_eq!(Some(owner.uid), t.metadata.uid);

        assert_eq!(resolver.calls(), 0);
    }

    #[tokio::test]
    async fn explicit_command_never_consults_resolver() {
        let resolver = Arc::new(CountingResolver::new());
        let c = compiler(resolver.clone());
        let t = task("t", vec![explicit("no-such-image", &["make"]).with_args(["all"])]);

        let unit = c.compile(&t, &CancellationToken::new()).await.unwrap();
        let args = &unit.spec.containers[0].args;
        assert_eq!(&args[6..], &["--command", "make", "all"]);
        assert_eq!(resolver.calls(), 0);
    }

    #[tokio::test]
    async fn same_image_is_resolved_once() {
        let resolver = Arc::new(
            CountingResolver::new().with_image("python:3.12", &["python3"], &["-V"]),
        );
        let c = compiler(resolver.clone());
        let t = task(
            "t",
            vec![
                Step::new("python:3.12"),
                Step::new("docker.io/library/python:3.12").with_args(["-c", "print(1)"]),
            ],
        );

        let unit = c.compile(&t, &CancellationToken::new()).await.unwrap();
        assert_eq!(resolver.calls(), 1);

        let first = &unit.spec.containers[0].args;
        assert_eq!(&first[6..], &["--command", "python3", "-V"]);
        let second = &unit.spec.containers[1].args;
        assert_eq!(&second[6..], &["--command", "python3", "-c", "print(1)"]);
    }

    #[tokio::test]
    async fn cache_is_shared_between_compilations() {
        let resolver = Arc::new(CountingResolver::new().with_image("node:22", &["node"], &[]));
        let c = compiler(resolver.clone());

        for name in ["a", "b", "c"] {
            c.compile(&task(name, vec![Step::new("node:22")]), &CancellationToken::new())
                .await
                .unwrap();
        }
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn resolver_failure_aborts_compilation() {
        let resolver = Arc::new(CountingResolver::new().with_image("alpine", &["/bin/sh"], &[]));
        let c = compiler(resolver.clone());
        let t = task("t", vec![Step::new("alpine"), Step::new("ghcr.io/org/missing:v1")]);

        let err = c.compile(&t, &CancellationToken::new()).await.unwrap_err();
        match err {
            CoreError::Resolution { step, image, .. } => {
                assert_eq!(step, "step-2");
                assert_eq!(image, "ghcr.io/org/missing:v1");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_reference_is_reported_per_step() {
        let c = compiler(Arc::new(CountingResolver::new()));
        let t = task("t", vec![Step::new("Not A Reference")]);

        let err = c.compile(&t, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::Reference { ref step, .. } if step == "step-1"));
    }

    #[tokio::test]
    async fn image_without_process_is_rejected() {
        let resolver = Arc::new(CountingResolver::new().with_image("scratch-app", &[], &[]));
        let c = compiler(resolver);
        let t = task("t", vec![Step::new("scratch-app")]);

        let err = c.compile(&t, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Resolution {
                source: ImageError::InvalidManifest(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn other_platform_entry_is_not_used() {
        let resolver = Arc::new(CountingResolver::new().with_image("alpine", &["/bin/sh"], &[]));
        let ctx = BuildContext::default().with_config(crate::CompilerConfig {
            platform: "linux/arm64".parse().unwrap(),
            ..Default::default()
        });
        let c = TaskCompiler::new(ctx, resolver, Arc::new(ImageCommandCache::default()));

        let err = c
            .compile(&task("t", vec![Step::new("alpine")]), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Resolution {
                source: ImageError::PlatformNotFound { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn invalid_tasks_are_rejected_before_resolution() {
        let resolver = Arc::new(CountingResolver::new());
        let c = compiler(resolver.clone());

        let empty = task("t", vec![]);
        let err = c.compile(&empty, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::Model(ModelError::Invalid(_))));

        let mut orphan = task("t", vec![Step::new("alpine")]);
        orphan.metadata.uid = None;
        let err = c.compile(&orphan, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::Model(_)));

        assert_eq!(resolver.calls(), 0);
    }

    #[tokio::test]
    async fn cancellation_interrupts_resolution() {
        let resolver = Arc::new(CountingResolver::hanging());
        let c = compiler(resolver.clone());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = c
            .compile(&task("t", vec![Step::new("alpine")]), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Canceled));
        assert_eq!(resolver.calls(), 1);
    }
}
