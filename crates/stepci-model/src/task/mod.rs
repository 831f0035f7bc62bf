mod step;
pub use step::Step;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::{
    ObjectMeta, OwnerReference,
    error::{ModelError, ModelResult},
};

/// User-declared ordered list of execution steps.
///
/// A `Task` compiles into exactly one workload unit whose containers run the steps one
/// after another, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: TaskSpec,
}

/// Desired state of a [`Task`].
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Task {
    /// Number of steps, i.e. the highest order value of the compiled unit.
    pub fn step_count(&self) -> usize {
        self.spec.steps.len()
    }

    /// Check the task can be compiled.
    ///
    /// Rules:
    /// - name is not empty;
    /// - at least one step;
    /// - every step has a non-empty image;
    /// - container names (explicit or derived) are unique.
    pub fn validate(&self) -> ModelResult<()> {
        if self.metadata.name.trim().is_empty() {
            return Err(ModelError::Invalid("task name is empty".into()));
        }
        if self.spec.steps.is_empty() {
            return Err(ModelError::Invalid(format!(
                "task {} declares no steps",
                self.metadata.name
            )));
        }

        let mut seen = HashSet::with_capacity(self.spec.steps.len());
        for (index, step) in self.spec.steps.iter().enumerate() {
            if step.image.trim().is_empty() {
                return Err(ModelError::Invalid(format!("step {} has no image", index + 1)));
            }
            let name = step.container_name(index);
            if !seen.insert(name.clone()) {
                return Err(ModelError::Invalid(format!("duplicate step name: {name}")));
            }
        }
        Ok(())
    }

    /// Owner reference pointing back at this task.
    ///
    /// Fails if the task was never persisted (no uid assigned).
    pub fn owner_reference(&self) -> ModelResult<OwnerReference> {
        let uid = self.metadata.uid.ok_or_else(|| {
            ModelError::Invalid(format!("task {} has no uid", self.metadata.key()))
        })?;
        Ok(OwnerReference {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            name: self.metadata.name.clone(),
            uid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn task(steps: Vec<Step>) -> Task {
        Task {
            api_version: "api.stepci.dev/v1alpha1".into(),
            kind: "Task".into(),
            metadata: ObjectMeta {
                name: "build".into(),
                namespace: "ci".into(),
                uid: Some(Uuid::nil()),
                ..Default::default()
            },
            spec: TaskSpec { steps },
        }
    }

    #[test]
    fn deserializes_task_document() {
        let json = r#"{
            "apiVersion": "api.stepci.dev/v1alpha1",
            "kind": "Task",
            "metadata": {"name": "build", "namespace": "ci", "uid": "6f1c1b5e-8a43-4a8e-9d52-0b8f0d1c2a11"},
            "spec": {"steps": [
                {"image": "alpine:3.20", "command": ["sh", "-c"], "args": ["echo hi"]},
                {"name": "compile", "image": "rust:1", "env": [{"name": "CI", "value": "1"}]}
            ]}
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();

        assert_eq!(task.step_count(), 2);
        assert_eq!(task.spec.steps[0].command, vec!["sh", "-c"]);
        assert_eq!(task.spec.steps[1].container_name(1), "compile");
        assert_eq!(task.spec.steps[1].env.get("CI"), Some("1"));
        assert!(task.validate().is_ok());
    }

    #[test]
    fn rejects_empty_steps() {
        let err = task(vec![]).validate().unwrap_err();
        assert!(matches!(err, ModelError::Invalid(msg) if msg.contains("no steps")));
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut a = Step::new("alpine");
        a.name = Some("same".into());
        let mut b = Step::new("busybox");
        b.name = Some("same".into());

        let err = task(vec![a, b]).validate().unwrap_err();
        assert!(matches!(err, ModelError::Invalid(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn derived_name_collision_is_detected() {
        let a = Step::new("alpine");
        let mut b = Step::new("busybox");
        b.name = Some("step-1".into());

        assert!(task(vec![a, b]).validate().is_err());
    }

    #[test]
    fn rejects_blank_image() {
        assert!(task(vec![Step::new("  ")]).validate().is_err());
    }

    #[test]
    fn owner_reference_requires_uid() {
        let mut t = task(vec![Step::new("alpine")]);
        let owner = t.owner_reference().unwrap();
        assert_eq!(owner.name, "build");
        assert_eq!(owner.kind, "Task");
        assert_eq!(owner.uid, Uuid::nil());

        t.metadata.uid = None;
        assert!(t.owner_reference().is_err());
    }
}
