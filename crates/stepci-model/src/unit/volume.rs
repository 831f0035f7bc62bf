use serde::{Deserialize, Serialize};

/// Named volume shared by the containers of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub name: String,
    #[serde(flatten)]
    pub source: VolumeSource,
}

/// Backing source of a [`Volume`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VolumeSource {
    /// Scratch directory living as long as the unit.
    EmptyDir {},
    /// Files whose content mirrors fields of the unit's own metadata.
    ///
    /// The control plane refreshes them when the referenced fields change.
    #[serde(rename = "downwardAPI")]
    DownwardApi { items: Vec<DownwardApiItem> },
}

/// One projected file of a downward-API volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownwardApiItem {
    /// File path relative to the mount root.
    pub path: String,
    /// Projected field, e.g. `metadata.annotations['taskorder']`.
    pub field_path: String,
}

impl Volume {
    pub fn empty_dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: VolumeSource::EmptyDir {},
        }
    }

    /// Volume exposing a single annotation as the file `path`.
    pub fn annotation_file(
        name: impl Into<String>,
        path: impl Into<String>,
        annotation: &str,
    ) -> Self {
        Self {
            name: name.into(),
            source: VolumeSource::DownwardApi {
                items: vec![DownwardApiItem {
                    path: path.into(),
                    field_path: format!("metadata.annotations['{annotation}']"),
                }],
            },
        }
    }
}
