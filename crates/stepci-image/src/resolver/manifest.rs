//! Manifest, index and image-config documents of the OCI / Docker v2 formats.
use serde::Deserialize;

use crate::{ImageCommand, ImageError, Platform};

pub(crate) const OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";
pub(crate) const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
pub(crate) const DOCKER_LIST: &str = "application/vnd.docker.distribution.manifest.list.v2+json";
pub(crate) const DOCKER_MANIFEST: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// `Accept` header value for manifest requests.
pub(crate) fn manifest_accept() -> String {
    [OCI_INDEX, DOCKER_LIST, OCI_MANIFEST, DOCKER_MANIFEST].join(", ")
}

/// Content descriptor pointing at another blob or manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Descriptor {
    #[serde(default)]
    pub media_type: Option<String>,
    pub digest: String,
    #[serde(default)]
    pub platform: Option<DescriptorPlatform>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DescriptorPlatform {
    pub os: String,
    pub architecture: String,
    #[serde(default)]
    pub variant: Option<String>,
}

/// Either a multi-platform index or a single image manifest.
#[derive(Debug)]
pub(crate) enum Manifest {
    Index(Vec<Descriptor>),
    Image { config: Descriptor },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    #[serde(default)]
    schema_version: Option<u32>,
    #[serde(default)]
    manifests: Option<Vec<Descriptor>>,
    #[serde(default)]
    config: Option<Descriptor>,
}

impl Manifest {
    /// Classify a manifest body by shape rather than by `Content-Type`, which some
    /// registries report inaccurately.
    pub fn parse(body: &[u8]) -> Result<Self, ImageError> {
        let raw: RawManifest = serde_json::from_slice(body)
            .map_err(|e| ImageError::InvalidManifest(format!("malformed manifest: {e}")))?;

        if raw.schema_version == Some(1) {
            return Err(ImageError::InvalidManifest(
                "schema v1 manifests are not supported".into(),
            ));
        }
        match (raw.manifests, raw.config) {
            (Some(manifests), _) => Ok(Manifest::Index(manifests)),
            (None, Some(config)) => Ok(Manifest::Image { config }),
            (None, None) => Err(ImageError::InvalidManifest(
                "manifest has neither manifests nor config".into(),
            )),
        }
    }
}

/// Pick the index entry built for `platform`.
pub(crate) fn select_platform<'a>(
    manifests: &'a [Descriptor],
    platform: &Platform,
) -> Option<&'a Descriptor> {
    manifests.iter().find(|d| {
        d.platform.as_ref().is_some_and(|p| {
            platform.matches(&p.os, &p.architecture, p.variant.as_deref())
        })
    })
}

/// Image configuration blob; only the fields needed to derive the default process.
#[derive(Debug, Deserialize)]
pub(crate) struct ImageConfig {
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub config: Option<ProcessConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProcessConfig {
    #[serde(rename = "Entrypoint", default)]
    pub entrypoint: Option<Vec<String>>,
    #[serde(rename = "Cmd", default)]
    pub cmd: Option<Vec<String>>,
}

impl ImageConfig {
    pub fn parse(body: &[u8]) -> Result<Self, ImageError> {
        serde_json::from_slice(body)
            .map_err(|e| ImageError::InvalidManifest(format!("malformed image config: {e}")))
    }

    /// Returns `true` if the config declares a platform that `platform` accepts.
    ///
    /// Configs without platform fields are accepted.
    pub fn runs_on(&self, platform: &Platform) -> bool {
        match (&self.os, &self.architecture) {
            (Some(os), Some(arch)) => platform.matches(os, arch, self.variant.as_deref()),
            _ => true,
        }
    }

    pub fn command(self) -> ImageCommand {
        let process = self.config.unwrap_or_default();
        ImageCommand::from_config(
            process.entrypoint.unwrap_or_default(),
            process.cmd.unwrap_or_default(),
        )
    }
}
