use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Observed state of a workload unit, as reported by the control plane.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitStatus {
    #[serde(default)]
    pub phase: UnitPhase,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub container_statuses: Vec<ContainerStatus>,
}

/// Coarse lifecycle phase of a unit.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitPhase {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl FromStr for UnitPhase {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "" => Ok(UnitPhase::Pending),
            "running" => Ok(UnitPhase::Running),
            "succeeded" => Ok(UnitPhase::Succeeded),
            "failed" => Ok(UnitPhase::Failed),
            "unknown" => Ok(UnitPhase::Unknown),
            other => Err(ModelError::UnknownPhase(other.to_string())),
        }
    }
}

impl fmt::Display for UnitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitPhase::Pending => "Pending",
            UnitPhase::Running => "Running",
            UnitPhase::Succeeded => "Succeeded",
            UnitPhase::Failed => "Failed",
            UnitPhase::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Observed state of one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStatus {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ContainerState>,
}

/// Lifecycle state of a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ContainerState {
    Waiting {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    Running {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        started_at: Option<String>,
    },
    Terminated {
        exit_code: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl ContainerStatus {
    pub fn running(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Some(ContainerState::Running { started_at: None }),
        }
    }

    pub fn terminated(name: impl Into<String>, exit_code: i32) -> Self {
        Self {
            name: name.into(),
            state: Some(ContainerState::Terminated {
                exit_code,
                reason: None,
            }),
        }
    }

    /// Exit code, once the container has terminated.
    pub fn exit_code(&self) -> Option<i32> {
        match &self.state {
            Some(ContainerState::Terminated { exit_code, .. }) => Some(*exit_code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_parses_case_insensitive() {
        assert_eq!("Running".parse::<UnitPhase>().unwrap(), UnitPhase::Running);
        assert_eq!("SUCCEEDED".parse::<UnitPhase>().unwrap(), UnitPhase::Succeeded);
        assert!("done".parse::<UnitPhase>().is_err());
    }

    #[test]
    fn waiting_and_running_have_no_exit_code() {
        let waiting = ContainerStatus {
            name: "a".into(),
            state: Some(ContainerState::Waiting {
                reason: Some("ContainerCreating".into()),
            }),
        };
        assert_eq!(waiting.exit_code(), None);
        assert_eq!(ContainerStatus::running("a").exit_code(), None);
        assert_eq!(ContainerStatus::terminated("a", 137).exit_code(), Some(137));
    }

    #[test]
    fn terminated_state_uses_camel_case_fields() {
        let json = serde_json::to_value(ContainerStatus::terminated("a", 2)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "a", "state": {"terminated": {"exitCode": 2}}})
        );
    }
}
