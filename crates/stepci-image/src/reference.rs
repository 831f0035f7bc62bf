use std::{fmt, str::FromStr};

use crate::ImageError;

/// Registry assumed when a reference does not name one.
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Host actually serving the registry API for [`DEFAULT_REGISTRY`].
const DEFAULT_REGISTRY_API_HOST: &str = "registry-1.docker.io";

const DEFAULT_TAG: &str = "latest";
const MAX_TAG_LEN: usize = 128;

/// Parsed, normalized image reference.
///
/// Parsing is lenient about what may be omitted and strict about what is written:
/// - no registry → [`DEFAULT_REGISTRY`];
/// - single-segment Docker Hub repositories get the `library/` namespace;
/// - neither tag nor digest → tag `latest`.
///
/// Two references naming the same image compare equal, so the type is usable as a cache key.
///
/// ```
/// use stepci_image::ImageReference;
///
/// let r: ImageReference = "alpine".parse().unwrap();
/// assert_eq!(r.to_string(), "docker.io/library/alpine:latest");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    registry: String,
    repository: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageReference {
    /// Parse a reference string.
    pub fn parse(raw: &str) -> Result<Self, ImageError> {
        let invalid = |reason: &str| ImageError::InvalidReference {
            reference: raw.to_string(),
            reason: reason.to_string(),
        };

        let input = raw.trim();
        if input.is_empty() {
            return Err(invalid("reference is empty"));
        }

        let (rest, digest) = match input.split_once('@') {
            Some((rest, digest)) => {
                validate_digest(digest).map_err(|reason| invalid(reason))?;
                (rest, Some(digest.to_string()))
            }
            None => (input, None),
        };

        let (registry, remainder) = match rest.split_once('/') {
            Some((first, remainder))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (first, remainder)
            }
            _ => (DEFAULT_REGISTRY, rest),
        };
        let registry = match registry {
            "index.docker.io" | "registry-1.docker.io" => DEFAULT_REGISTRY,
            other => other,
        };

        let (path, tag) = match remainder.rfind(':') {
            Some(i) if !remainder[i..].contains('/') => {
                (&remainder[..i], Some(&remainder[i + 1..]))
            }
            _ => (remainder, None),
        };

        validate_repository(path).map_err(|reason| invalid(reason))?;
        if let Some(tag) = tag {
            validate_tag(tag).map_err(|reason| invalid(reason))?;
        }

        let repository = if registry == DEFAULT_REGISTRY && !path.contains('/') {
            format!("library/{path}")
        } else {
            path.to_string()
        };
        let tag = match (tag, &digest) {
            (Some(tag), _) => Some(tag.to_string()),
            (None, None) => Some(DEFAULT_TAG.to_string()),
            (None, Some(_)) => None,
        };

        Ok(Self {
            registry: registry.to_string(),
            repository,
            tag,
            digest,
        })
    }

    /// Registry as written in the reference (after normalization), e.g. `ghcr.io`.
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Host serving the distribution API for this registry.
    pub fn api_host(&self) -> &str {
        if self.registry == DEFAULT_REGISTRY {
            DEFAULT_REGISTRY_API_HOST
        } else {
            &self.registry
        }
    }

    /// Repository path, e.g. `library/alpine`.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Manifest identifier to request: the digest if pinned, otherwise the tag.
    pub fn manifest_ref(&self) -> &str {
        self.digest
            .as_deref()
            .or(self.tag.as_deref())
            .unwrap_or(DEFAULT_TAG)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

impl FromStr for ImageReference {
    type Err = ImageError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn validate_repository(path: &str) -> Result<(), &'static str> {
    if path.is_empty() {
        return Err("repository is empty");
    }
    for component in path.split('/') {
        if component.is_empty() {
            return Err("repository has an empty path component");
        }
        let valid = component
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b"._-".contains(&b));
        if !valid {
            return Err("repository may only contain lowercase letters, digits and separators");
        }
        let first = component.as_bytes()[0];
        let last = component.as_bytes()[component.len() - 1];
        if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
            return Err("repository components must start and end with an alphanumeric");
        }
    }
    Ok(())
}

fn validate_tag(tag: &str) -> Result<(), &'static str> {
    if tag.is_empty() || tag.len() > MAX_TAG_LEN {
        return Err("tag must be 1 to 128 characters");
    }
    if tag.starts_with(['.', '-']) {
        return Err("tag must not start with '.' or '-'");
    }
    let valid = tag
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b"._-".contains(&b));
    if !valid {
        return Err("tag contains invalid characters");
    }
    Ok(())
}

fn validate_digest(digest: &str) -> Result<(), &'static str> {
    let Some((algorithm, hex)) = digest.split_once(':') else {
        return Err("digest must be algorithm:hex");
    };
    if algorithm.is_empty() || hex.len() < 32 {
        return Err("digest is too short");
    }
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err("digest is not hex encoded");
    }
    Ok(())
}
