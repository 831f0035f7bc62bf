mod container;
pub use container::{Container, ResourceRequirements, VolumeMount};

mod volume;
pub use volume::{DownwardApiItem, Volume, VolumeSource};

mod status;
pub use status::{ContainerState, ContainerStatus, UnitPhase, UnitStatus};

mod policy;
pub use policy::{PullPolicy, RestartPolicy};

use serde::{Deserialize, Serialize};

use crate::{ANNOTATION_TASK_ORDER, ModelResult, ObjectMeta, TaskOrder};

/// Compiled multi-container execution unit of a task.
///
/// Serialized in pod shape: `metadata`, `spec`, `status`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadUnit {
    pub metadata: ObjectMeta,
    pub spec: UnitSpec,
    #[serde(default)]
    pub status: UnitStatus,
}

/// Desired state of a [`WorkloadUnit`].
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init_containers: Vec<Container>,
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
    #[serde(default)]
    pub restart_policy: RestartPolicy,
}

impl WorkloadUnit {
    /// Current order state, parsed against the number of step containers.
    pub fn order(&self) -> ModelResult<TaskOrder> {
        TaskOrder::from_annotations(&self.metadata.annotations, self.spec.containers.len())
    }

    /// Raw order annotation, if present.
    pub fn raw_order(&self) -> Option<&str> {
        self.metadata.annotations.get(ANNOTATION_TASK_ORDER)
    }

    /// Overwrite the order annotation. Nothing else is touched.
    pub fn set_order(&mut self, order: TaskOrder) {
        self.metadata
            .annotations
            .insert(ANNOTATION_TASK_ORDER, order.to_string());
    }

    pub fn phase(&self) -> UnitPhase {
        self.status.phase
    }

    /// Observed status of the container named `name`.
    ///
    /// Statuses are matched by name: the control plane does not guarantee their order.
    pub fn container_status(&self, name: &str) -> Option<&ContainerStatus> {
        self.status
            .container_statuses
            .iter()
            .find(|status| status.name == name)
    }
}
