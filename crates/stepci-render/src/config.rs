use std::{fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use stepci_core::CompilerConfig;
use stepci_image::RegistryConfig;
use stepci_observe::LoggerConfig;

/// Configuration file of `stepci-render`. Every section is optional.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    pub logger: LoggerConfig,
    pub compiler: CompilerConfig,
    pub registry: RegistryConfig,
}

impl RenderConfig {
    /// Load from a JSON file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }
}
