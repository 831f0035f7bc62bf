use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;
use uuid::Uuid;

use stepci_model::{UnitStatus, WorkloadUnit};

use crate::plane::{ControlPlane, ControlPlaneError};

type Key = (String, String);

/// In-process control plane.
///
/// Behaves like the real one where the build logic can tell the difference:
/// - `create` assigns a uid and the first resource version, and refuses existing keys;
/// - `update` requires the stored resource version and bumps it;
/// - status is only changed through [`MemoryControlPlane::set_status`], which also
///   bumps the version, as a kubelet status report would.
///
/// Write calls are counted so callers can assert how many writes a build performed.
#[derive(Debug, Default)]
pub struct MemoryControlPlane {
    state: Mutex<State>,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

#[derive(Debug, Default)]
struct State {
    version: u64,
    units: HashMap<Key, WorkloadUnit>,
}

impl State {
    fn next_version(&mut self) -> String {
        self.version += 1;
        self.version.to_string()
    }
}

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

fn key_string(key: &Key) -> String {
    format!("{}/{}", key.0, key.1)
}

impl MemoryControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accepted `create` calls.
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::Relaxed)
    }

    /// Number of accepted `update` calls.
    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::Relaxed)
    }

    /// Accepted writes of both kinds.
    pub fn writes(&self) -> usize {
        self.creates() + self.updates()
    }

    pub fn len(&self) -> usize {
        self.state.lock().units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current stored copy of a unit.
    pub fn snapshot(&self, namespace: &str, name: &str) -> Option<WorkloadUnit> {
        self.state.lock().units.get(&key(namespace, name)).cloned()
    }

    /// Replace the observed status of a unit. Not counted as a write.
    pub fn set_status(
        &self,
        namespace: &str,
        name: &str,
        status: UnitStatus,
    ) -> Result<(), ControlPlaneError> {
        let key = key(namespace, name);
        let mut state = self.state.lock();
        let version = state.next_version();
        let unit = state
            .units
            .get_mut(&key)
            .ok_or_else(|| ControlPlaneError::NotFound(key_string(&key)))?;
        unit.status = status;
        unit.metadata.resource_version = Some(version);
        Ok(())
    }
}

#[async_trait]
impl ControlPlane for MemoryControlPlane {
    async fn get(&self, namespace: &str, name: &str) -> Result<WorkloadUnit, ControlPlaneError> {
        self.snapshot(namespace, name)
            .ok_or_else(|| ControlPlaneError::NotFound(format!("{namespace}/{name}")))
    }

    async fn create(&self, unit: &WorkloadUnit) -> Result<WorkloadUnit, ControlPlaneError> {
        let key = key(&unit.metadata.namespace, &unit.metadata.name);
        let mut state = self.state.lock();
        if state.units.contains_key(&key) {
            return Err(ControlPlaneError::AlreadyExists(key_string(&key)));
        }

        let mut stored = unit.clone();
        stored.metadata.uid = Some(Uuid::new_v4());
        stored.metadata.resource_version = Some(state.next_version());
        stored.status = UnitStatus::default();

        trace!(unit = %key_string(&key), version = ?stored.metadata.resource_version, "unit created");
        state.units.insert(key, stored.clone());
        self.creates.fetch_add(1, Ordering::Relaxed);
        Ok(stored)
    }

    async fn update(&self, unit: &WorkloadUnit) -> Result<WorkloadUnit, ControlPlaneError> {
        let key = key(&unit.metadata.namespace, &unit.metadata.name);
        let mut state = self.state.lock();
        let actual = state
            .units
            .get(&key)
            .ok_or_else(|| ControlPlaneError::NotFound(key_string(&key)))?
            .metadata
            .resource_version
            .clone()
            .unwrap_or_default();
        if unit.metadata.resource_version.as_deref() != Some(actual.as_str()) {
            return Err(ControlPlaneError::Conflict {
                key: key_string(&key),
                expected: unit.metadata.resource_version.clone(),
                actual,
            });
        }

        let version = state.next_version();
        let stored = state
            .units
            .get_mut(&key)
            .ok_or_else(|| ControlPlaneError::NotFound(key_string(&key)))?;
        let uid = stored.metadata.uid;
        stored.metadata = unit.metadata.clone();
        stored.metadata.uid = uid;
        stored.metadata.resource_version = Some(version);
        stored.spec = unit.spec.clone();

        trace!(unit = %key_string(&key), version = ?stored.metadata.resource_version, "unit updated");
        self.updates.fetch_add(1, Ordering::Relaxed);
        Ok(stored.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepci_model::{ObjectMeta, UnitPhase};

    fn unit(name: &str) -> WorkloadUnit {
        WorkloadUnit {
            metadata: ObjectMeta {
                name: name.into(),
                namespace: "ci".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_identity_and_rejects_duplicates() {
        let plane = MemoryControlPlane::new();
        let created = plane.create(&unit("a")).await.unwrap();

        assert!(created.metadata.uid.is_some());
        assert_eq!(created.metadata.resource_version.as_deref(), Some("1"));

        let err = plane.create(&unit("a")).await.unwrap_err();
        assert!(matches!(err, ControlPlaneError::AlreadyExists(_)));
        assert_eq!(plane.creates(), 1);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let plane = MemoryControlPlane::new();
        let err = plane.get("ci", "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn update_requires_current_version() {
        let plane = MemoryControlPlane::new();
        let created = plane.create(&unit("a")).await.unwrap();

        plane
            .set_status("ci", "a", UnitStatus {
                phase: UnitPhase::Running,
                ..Default::default()
            })
            .unwrap();

        let err = plane.update(&created).await.unwrap_err();
        assert!(matches!(err, ControlPlaneError::Conflict { .. }));
        assert_eq!(plane.updates(), 0);

        let fresh = plane.get("ci", "a").await.unwrap();
        let updated = plane.update(&fresh).await.unwrap();
        assert_ne!(updated.metadata.resource_version, fresh.metadata.resource_version);
        assert_eq!(plane.updates(), 1);
    }

    #[tokio::test]
    async fn update_never_writes_status() {
        let plane = MemoryControlPlane::new();
        plane.create(&unit("a")).await.unwrap();

        let mut fresh = plane.get("ci", "a").await.unwrap();
        fresh.status.phase = UnitPhase::Succeeded;
        fresh.metadata.annotations.insert("k", "v");
        plane.update(&fresh).await.unwrap();

        let stored = plane.snapshot("ci", "a").unwrap();
        assert_eq!(stored.phase(), UnitPhase::Pending);
        assert_eq!(stored.metadata.annotations.get("k"), Some("v"));
    }

    #[test]
    fn set_status_on_missing_unit_fails() {
        let plane = MemoryControlPlane::new();
        let err = plane
            .set_status("ci", "missing", UnitStatus::default())
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(plane.is_empty());
    }
}
