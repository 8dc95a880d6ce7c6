// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

/// Prefix of the connection point references that point to a network
/// function, e.g., `vnf_firewall:input`.
pub const VNF_PREFIX: &str = "vnf_";

/// Prefix of the connection point references that point to a service
/// access point, e.g., `ns:input`.
pub const ACCESS_POINT_PREFIX: &str = "ns";

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NetworkFunction {
    /// Identifier of the function within the service, e.g., `vnf_firewall`.
    pub vnf_id: String,
    pub vnf_vendor: String,
    pub vnf_name: String,
    pub vnf_version: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ConnectionPoint {
    pub id: String,
    #[serde(default)]
    pub interface: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum ConnectivityType {
    #[serde(rename = "E-Line")]
    ELine,
    #[serde(rename = "E-LAN")]
    ELan,
    #[serde(rename = "E-Tree")]
    ETree,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VirtualLink {
    pub id: String,
    pub connectivity_type: ConnectivityType,
    /// References of the form `<vnf_id>:<port>` or `ns:<access point>`.
    pub connection_points_reference: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ForwardingPathPoint {
    pub connection_point_ref: String,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ForwardingPath {
    pub fp_id: String,
    #[serde(default)]
    pub policy: String,
    pub connection_points: Vec<ForwardingPathPoint>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ForwardingGraph {
    pub fg_id: String,
    #[serde(default)]
    pub constituent_vnfs: Vec<String>,
    #[serde(default)]
    pub constituent_virtual_links: Vec<String>,
    #[serde(default)]
    pub network_forwarding_paths: Vec<ForwardingPath>,
}

/// Network service descriptor.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ServiceDescriptor {
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub network_functions: Vec<NetworkFunction>,
    #[serde(default)]
    pub connection_points: Vec<ConnectionPoint>,
    #[serde(default)]
    pub virtual_links: Vec<VirtualLink>,
    #[serde(default)]
    pub forwarding_graphs: Vec<ForwardingGraph>,
}

/// Resources requested by a single virtual deployment unit.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ResourceRequirements {
    /// Number of (virtual) CPU units.
    pub cpu: f64,
    /// Memory, in GB.
    #[serde(default)]
    pub memory: f64,
    /// Storage, in GB.
    #[serde(default)]
    pub storage: f64,
}

impl std::ops::Add for ResourceRequirements {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            cpu: self.cpu + other.cpu,
            memory: self.memory + other.memory,
            storage: self.storage + other.storage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VirtualDeploymentUnit {
    pub id: String,
    pub vm_image: String,
    pub resource_requirements: ResourceRequirements,
    #[serde(default)]
    pub connection_points: Vec<ConnectionPoint>,
}

/// Virtual network function descriptor.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VnfDescriptor {
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub virtual_deployment_units: Vec<VirtualDeploymentUnit>,
    #[serde(default)]
    pub connection_points: Vec<ConnectionPoint>,
}

impl VnfDescriptor {
    /// Total resources needed by one instance of this function, i.e., the
    /// sum over all its virtual deployment units.
    pub fn resource_requirements(&self) -> ResourceRequirements {
        self.virtual_deployment_units
            .iter()
            .fold(ResourceRequirements::default(), |acc, vdu| acc + vdu.resource_requirements.clone())
    }
}

/// Parsed content of a service package: one service descriptor and the
/// descriptors of the functions it uses.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ServiceData {
    pub nsd: ServiceDescriptor,
    pub vnfds: Vec<VnfDescriptor>,
}

impl ServiceData {
    /// Return the network function with the given identifier.
    pub fn network_function(&self, vnf_id: &str) -> Option<&NetworkFunction> {
        self.nsd.network_functions.iter().find(|nf| nf.vnf_id == vnf_id)
    }

    /// Return the descriptor of a network function, matched by
    /// vendor, name, and version.
    pub fn vnfd(&self, function: &NetworkFunction) -> Option<&VnfDescriptor> {
        self.vnfds
            .iter()
            .find(|vnfd| vnfd.vendor == function.vnf_vendor && vnfd.name == function.vnf_name && vnfd.version == function.vnf_version)
    }

    /// Return true if the service declares an access point with that id.
    pub fn has_access_point(&self, id: &str) -> bool {
        self.nsd.connection_points.iter().any(|cp| cp.id == id)
    }
}

/// Endpoint of a virtual link, as found in a connection point reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEndpoint {
    /// 0: vnf_id
    /// 1: port
    Function(String, String),
    /// 0: full access point id, e.g., `ns:input`
    AccessPoint(String),
}

impl LinkEndpoint {
    /// Split a connection point reference into its owner and port.
    ///
    /// References without a colon are interpreted as access points.
    pub fn parse(reference: &str) -> Self {
        match reference.split_once(':') {
            Some((owner, _)) if owner == ACCESS_POINT_PREFIX => LinkEndpoint::AccessPoint(reference.to_string()),
            Some((owner, port)) => LinkEndpoint::Function(owner.to_string(), port.to_string()),
            None => LinkEndpoint::AccessPoint(reference.to_string()),
        }
    }
}

impl std::fmt::Display for LinkEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LinkEndpoint::Function(vnf_id, port) => write!(f, "{}:{}", vnf_id, port),
            LinkEndpoint::AccessPoint(id) => write!(f, "{}", id),
        }
    }
}
