mod domain;
pub use domain::{
    ANNOTATION_TASK_ORDER, Annotations, Env, EnvVar, ORDER_FAILED, ORDER_NOT_STARTED, TaskOrder,
};

mod error;
pub use error::{ModelError, ModelResult};

mod meta;
pub use meta::{ObjectMeta, OwnerReference};

mod task;
pub use task::{Step, Task, TaskSpec};

mod unit;
pub use unit::{
    Container, ContainerState, ContainerStatus, DownwardApiItem, PullPolicy, ResourceRequirements,
    RestartPolicy, UnitPhase, UnitSpec, UnitStatus, Volume, VolumeMount, VolumeSource,
    WorkloadUnit,
};
