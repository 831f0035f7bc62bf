use serde::{Deserialize, Serialize};

use stepci_image::{DEFAULT_CACHE_CAPACITY, Platform};

use crate::error::CoreError;

/// Compiler configuration.
///
/// Every path here is part of the contract with the helper binary: the init container
/// copies `helper_source` into `helper_dir`, and step containers start `helper_binary`
/// waiting on `podinfo_dir/order_file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerConfig {
    /// Prepended to the task name to form the unit name.
    pub unit_prefix: String,
    /// Image shipping the helper binary.
    pub helper_image: String,
    /// Location of the helper binary inside `helper_image`.
    pub helper_source: String,
    /// Mount path of the shared emptyDir volume.
    pub helper_dir: String,
    /// Launch command of every step container.
    pub helper_binary: String,
    /// Mount path of the downward-API volume.
    pub podinfo_dir: String,
    /// File under `podinfo_dir` exposing the order annotation.
    pub order_file: String,
    /// Platform whose image configuration is used for command resolution.
    pub platform: Platform,
    /// Capacity of the image command cache.
    pub cache_capacity: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            unit_prefix: "task-pod-".into(),
            helper_image: "stepci/entrypoint:v1".into(),
            helper_source: "/app/entrypoint".into(),
            helper_dir: "/entrypoint/bin".into(),
            helper_binary: "/entrypoint/bin/entrypoint".into(),
            podinfo_dir: "/etc/podinfo".into(),
            order_file: "order".into(),
            platform: Platform::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl CompilerConfig {
    /// Path of the order file as seen from a step container.
    pub fn order_path(&self) -> String {
        format!(
            "{}/{}",
            self.podinfo_dir.trim_end_matches('/'),
            self.order_file
        )
    }

    /// Reject configurations that would produce an unusable unit.
    pub fn validate(&self) -> Result<(), CoreError> {
        let required = [
            ("helperImage", &self.helper_image),
            ("helperSource", &self.helper_source),
            ("helperDir", &self.helper_dir),
            ("helperBinary", &self.helper_binary),
            ("podinfoDir", &self.podinfo_dir),
            ("orderFile", &self.order_file),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::Config(format!("{field} must not be empty")));
            }
        }
        if self.order_file.contains('/') {
            return Err(CoreError::Config(format!(
                "orderFile must be a plain file name, got {:?}",
                self.order_file
            )));
        }
        if self.cache_capacity == 0 {
            return Err(CoreError::Config("cacheCapacity must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CompilerConfig::default();

        assert_eq!(config.unit_prefix, "task-pod-");
        assert_eq!(config.helper_binary, "/entrypoint/bin/entrypoint");
        assert_eq!(config.order_path(), "/etc/podinfo/order");
        assert_eq!(config.platform.to_string(), "linux/amd64");
        assert_eq!(config.cache_capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_deserialization() {
        let json = r#"{"unitPrefix": "ci-", "platform": "linux/arm64/v8", "podinfoDir": "/run/info/"}"#;
        let config: CompilerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.unit_prefix, "ci-");
        assert_eq!(config.platform.variant(), Some("v8"));
        assert_eq!(config.order_path(), "/run/info/order");
        assert_eq!(config.helper_image, CompilerConfig::default().helper_image);
    }

    #[test]
    fn invalid_platform_fails_deserialization() {
        let json = r#"{"platform": "linux"}"#;
        assert!(serde_json::from_str::<CompilerConfig>(json).is_err());
    }

    #[test]
    fn validate_rejects_unusable_values() {
        let empty_image = CompilerConfig {
            helper_image: " ".into(),
            ..Default::default()
        };
        assert!(matches!(empty_image.validate(), Err(CoreError::Config(_))));

        let nested = CompilerConfig {
            order_file: "a/b".into(),
            ..Default::default()
        };
        assert!(nested.validate().is_err());

        let zero = CompilerConfig {
            cache_capacity: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
    }
}
