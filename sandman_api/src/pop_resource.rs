// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

/// Capacity of a point of presence.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SystemResource {
    /// Number of CPU units.
    pub cpu: f64,
    /// Memory, in GB.
    pub memory: f64,
    /// Storage, in GB.
    pub storage: f64,
}

impl std::fmt::Display for SystemResource {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "cpu {} memory {} storage {}", self.cpu, self.memory, self.storage)
    }
}

/// A point of presence (datacenter) where function instances can be
/// deployed.
///
/// The endpoint and credentials are only meaningful to the
/// infrastructure backend.
#[derive(Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PopResource {
    pub pop_name: String,
    pub endpoint: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub tenant_name: String,
    pub resources: SystemResource,
}

// Hand-written so that passwords never end up in the logs.
impl std::fmt::Debug for PopResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopResource")
            .field("pop_name", &self.pop_name)
            .field("endpoint", &self.endpoint)
            .field("user_name", &self.user_name)
            .field("tenant_name", &self.tenant_name)
            .field("resources", &self.resources)
            .finish()
    }
}

impl std::fmt::Display for PopResource {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} at {} (cpu {}, memory {}, storage {})",
            self.pop_name, self.endpoint, self.resources.cpu, self.resources.memory, self.resources.storage
        )
    }
}

/// Connectivity between two points of presence.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PopLink {
    pub from: String,
    pub to: String,
    /// Nominal bandwidth, in Mb/s, if known.
    #[serde(default)]
    pub bandwidth: Option<f64>,
}
