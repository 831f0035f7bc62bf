use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Platform;

/// Default process of an image: what runs when a container declares no command.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCommand {
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ImageCommand {
    /// Derive the default process from an image configuration.
    ///
    /// `Entrypoint` becomes the command and `Cmd` its arguments. Images without an
    /// entrypoint run `Cmd` itself.
    pub fn from_config(entrypoint: Vec<String>, cmd: Vec<String>) -> Self {
        if entrypoint.is_empty() {
            Self {
                command: cmd,
                args: Vec::new(),
            }
        } else {
            Self {
                command: entrypoint,
                args: cmd,
            }
        }
    }
}

/// Resolved commands of one image reference, keyed by platform (`os/arch[/variant]`).
///
/// Entries are immutable once cached.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageCommandEntry(BTreeMap<String, ImageCommand>);

impl ImageCommandEntry {
    /// Entry holding the command of a single platform.
    pub fn single(platform: &Platform, command: ImageCommand) -> Self {
        Self(BTreeMap::from([(platform.to_string(), command)]))
    }

    pub fn for_platform(&self, platform: &Platform) -> Option<&ImageCommand> {
        self.0.get(&platform.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn entrypoint_takes_cmd_as_args() {
        let c = ImageCommand::from_config(strings(&["/docker-entrypoint.sh"]), strings(&["nginx"]));
        assert_eq!(c.command, strings(&["/docker-entrypoint.sh"]));
        assert_eq!(c.args, strings(&["nginx"]));
    }

    #[test]
    fn cmd_alone_becomes_command() {
        let c = ImageCommand::from_config(vec![], strings(&["/bin/sh"]));
        assert_eq!(c.command, strings(&["/bin/sh"]));
        assert!(c.args.is_empty());
    }

    #[test]
    fn entry_lookup_is_per_platform() {
        let amd64 = Platform::default();
        let entry = ImageCommandEntry::single(&amd64, ImageCommand::from_config(vec![], strings(&["sh"])));

        assert!(entry.for_platform(&amd64).is_some());
        assert!(entry.for_platform(&Platform::new("linux", "arm64")).is_none());
    }
}
