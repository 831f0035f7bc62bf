use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ModelError, ModelResult};

/// Restart policy of every container in a unit.
///
/// Compiled units always use `Never`: a failed step must stay failed.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestartPolicy {
    #[default]
    Never,
    Always,
    OnFailure,
}

impl FromStr for RestartPolicy {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(RestartPolicy::Always),
            "never" | "" => Ok(RestartPolicy::Never),
            "onfailure" | "on-failure" => Ok(RestartPolicy::OnFailure),
            other => Err(ModelError::UnknownRestart(other.to_string())),
        }
    }
}

/// When the node pulls a container image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PullPolicy {
    Always,
    IfNotPresent,
    Never,
}

impl FromStr for PullPolicy {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(PullPolicy::Always),
            "ifnotpresent" | "if-not-present" => Ok(PullPolicy::IfNotPresent),
            "never" => Ok(PullPolicy::Never),
            other => Err(ModelError::UnknownPullPolicy(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_policy_serializes_pascal_case() {
        assert_eq!(serde_json::to_string(&RestartPolicy::Never).unwrap(), "\"Never\"");
        assert_eq!(
            serde_json::to_string(&RestartPolicy::OnFailure).unwrap(),
            "\"OnFailure\""
        );
    }

    #[test]
    fn parses_loose_spellings() {
        assert_eq!("on-failure".parse::<RestartPolicy>().unwrap(), RestartPolicy::OnFailure);
        assert_eq!("IfNotPresent".parse::<PullPolicy>().unwrap(), PullPolicy::IfNotPresent);
        assert!("sometimes".parse::<PullPolicy>().is_err());
    }
}
