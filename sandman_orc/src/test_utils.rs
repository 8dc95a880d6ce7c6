// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

use sandman_api::descriptor::*;
use sandman_api::pop_resource::{PopResource, SystemResource};

/// Service chaining the given functions, in order, between the access
/// points `ns:input` and `ns:output`. Each function has one VDU requiring
/// the given number of CPUs.
pub(crate) fn make_service_data(functions: &[(&str, f64)]) -> ServiceData {
    let mut network_functions = vec![];
    let mut vnfds = vec![];
    for (vnf_id, cpu) in functions {
        let vnf_name = format!("{}-vnf", vnf_id.strip_prefix(VNF_PREFIX).unwrap_or(vnf_id));
        network_functions.push(NetworkFunction {
            vnf_id: vnf_id.to_string(),
            vnf_vendor: "eu.sonata-nfv".to_string(),
            vnf_name: vnf_name.clone(),
            vnf_version: "0.1".to_string(),
        });
        vnfds.push(VnfDescriptor {
            vendor: "eu.sonata-nfv".to_string(),
            name: vnf_name,
            version: "0.1".to_string(),
            virtual_deployment_units: vec![VirtualDeploymentUnit {
                id: "vdu01".to_string(),
                vm_image: format!("sonata-{}", vnf_id),
                resource_requirements: ResourceRequirements {
                    cpu: *cpu,
                    memory: 1.0,
                    storage: 10.0,
                },
                connection_points: vec![],
            }],
            connection_points: vec![],
        });
    }

    let mut references = vec!["ns:input".to_string()];
    for (vnf_id, _) in functions {
        references.push(format!("{}:input", vnf_id));
        references.push(format!("{}:output", vnf_id));
    }
    references.push("ns:output".to_string());
    let virtual_links = references
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| VirtualLink {
            id: format!("link-{}", i),
            connectivity_type: ConnectivityType::ELine,
            connection_points_reference: pair.to_vec(),
        })
        .collect();

    ServiceData {
        nsd: ServiceDescriptor {
            vendor: "eu.sonata-nfv".to_string(),
            name: "test-service".to_string(),
            version: "0.1".to_string(),
            network_functions,
            connection_points: vec![
                ConnectionPoint {
                    id: "ns:input".to_string(),
                    interface: "ipv4".to_string(),
                    kind: "external".to_string(),
                },
                ConnectionPoint {
                    id: "ns:output".to_string(),
                    interface: "ipv4".to_string(),
                    kind: "external".to_string(),
                },
            ],
            virtual_links,
            forwarding_graphs: vec![],
        },
        vnfds,
    }
}

pub(crate) fn make_pop(name: &str, cpu: f64) -> PopResource {
    PopResource {
        pop_name: name.to_string(),
        endpoint: format!("http://{}.example.com:5000/v2.0", name),
        user_name: "admin".to_string(),
        password: "admin".to_string(),
        tenant_name: "tenant".to_string(),
        resources: SystemResource {
            cpu,
            memory: 64.0,
            storage: 1000.0,
        },
    }
}

pub(crate) fn make_catalog(pops: &[(&str, f64)]) -> crate::catalog::ResourceCatalog {
    crate::catalog::ResourceCatalog::new(pops.iter().map(|(name, cpu)| make_pop(name, *cpu)).collect(), vec![])
}
