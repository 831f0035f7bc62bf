mod env_var;
pub use env_var::EnvVar;

mod env;
pub use env::Env;

mod annotations;
pub use annotations::Annotations;

mod constants;
pub use constants::{ANNOTATION_TASK_ORDER, ORDER_FAILED, ORDER_NOT_STARTED};

mod order;
pub use order::TaskOrder;
