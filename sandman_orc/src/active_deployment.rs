// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

use crate::placement_logic::PlacementMapping;
use crate::service_instance::ServiceInstance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum DeploymentState {
    Idle,
    Deploying,
    Deployed,
    TearingDown,
}

impl std::fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentState::Idle => write!(f, "IDLE"),
            DeploymentState::Deploying => write!(f, "DEPLOYING"),
            DeploymentState::Deployed => write!(f, "DEPLOYED"),
            DeploymentState::TearingDown => write!(f, "TEARING_DOWN"),
        }
    }
}

/// The service currently deployed, with its placement.
#[derive(Debug, Clone)]
pub struct ActiveDeployment {
    pub instance: ServiceInstance,
    pub mapping: PlacementMapping,
    pub deployed_at: chrono::DateTime<chrono::Utc>,
}

/// Immutable view of the orchestrator state.
#[derive(Debug, Clone)]
pub struct DeploymentSnapshot {
    pub state: DeploymentState,
    pub active: Option<std::sync::Arc<ActiveDeployment>>,
    /// Deployment tracking map. key: PoP name, value: deployment name
    pub stacks: std::collections::BTreeMap<String, String>,
}

impl Default for DeploymentSnapshot {
    fn default() -> Self {
        Self {
            state: DeploymentState::Idle,
            active: None,
            stacks: std::collections::BTreeMap::new(),
        }
    }
}

impl DeploymentSnapshot {
    pub fn is_deployed(&self) -> bool {
        self.state == DeploymentState::Deployed && self.active.is_some()
    }
}

/// Shared reference to the orchestrator state.
///
/// Only the orchestrator writes, replacing the whole snapshot at once. All
/// the others read a snapshot and keep it for as long as they need.
#[derive(Clone, Default)]
pub struct DeploymentHandle {
    current: std::sync::Arc<std::sync::RwLock<std::sync::Arc<DeploymentSnapshot>>>,
}

impl DeploymentHandle {
    pub fn snapshot(&self) -> std::sync::Arc<DeploymentSnapshot> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn swap(&self, snapshot: DeploymentSnapshot) {
        let snapshot = std::sync::Arc::new(snapshot);
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = snapshot;
    }

    /// Change the state only, keeping the rest.
    pub(crate) fn set_state(&self, state: DeploymentState) {
        let mut snapshot = (*self.snapshot()).clone();
        snapshot.state = state;
        self.swap(snapshot);
    }

    pub fn state(&self) -> DeploymentState {
        self.snapshot().state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_snapshot_swap() {
        let handle = DeploymentHandle::default();
        let before = handle.snapshot();
        assert_eq!(DeploymentState::Idle, before.state);
        assert!(!before.is_deployed());

        let data = make_service_data(&[("vnf_firewall", 1.0)]);
        let instance = ServiceInstance::initialize(&data, &std::collections::BTreeMap::new()).unwrap();
        handle.swap(DeploymentSnapshot {
            state: DeploymentState::Deployed,
            active: Some(std::sync::Arc::new(ActiveDeployment {
                instance,
                mapping: PlacementMapping::default(),
                deployed_at: chrono::Utc::now(),
            })),
            stacks: std::collections::BTreeMap::from([("A".to_string(), "stack-1".to_string())]),
        });

        // A reader holding the old snapshot is not affected.
        assert!(before.active.is_none());
        assert!(handle.snapshot().is_deployed());

        handle.set_state(DeploymentState::TearingDown);
        let after = handle.snapshot();
        assert_eq!(DeploymentState::TearingDown, after.state);
        assert_eq!(1, after.stacks.len());
        assert_eq!("TEARING_DOWN", after.state.to_string());
    }
}
