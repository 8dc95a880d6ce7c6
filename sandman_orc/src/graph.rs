// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

use crate::catalog::ResourceCatalog;
use crate::service_instance::ServiceInstance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum NodeKind {
    Function,
    AccessPoint,
    Pop,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    /// PoP hosting the node, for function instances that are placed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pop: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    /// Identifier of the virtual link, empty for inter-PoP links.
    pub link_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    fn has_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|x| x.id == id)
    }

    fn add_edge(&mut self, source: &str, target: &str, link_id: &str, bandwidth: Option<f64>) {
        if !self.has_node(source) || !self.has_node(target) {
            log::warn!("Link {} between {} and {} has a dangling endpoint: not in the graph", link_id, source, target);
            return;
        }
        self.edges.push(GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            link_id: link_id.to_string(),
            bandwidth,
        });
    }
}

/// Build the graph of a service instance: function instances and access
/// points, connected by their links. Links among more than two instances
/// result in one edge per pair.
///
/// * Return None if there is no service instance.
pub fn service_graph(instance: Option<&ServiceInstance>) -> Option<Graph> {
    let instance = instance?;
    let mut graph = Graph::default();
    for function in instance.functions() {
        graph.nodes.push(GraphNode {
            id: function.name.clone(),
            kind: NodeKind::Function,
            pop: function.pop.clone(),
        });
    }
    for access_point in &instance.service.connection_points {
        graph.nodes.push(GraphNode {
            id: access_point.id.clone(),
            kind: NodeKind::AccessPoint,
            pop: None,
        });
    }

    for links in instance.inner_links().values() {
        for link in links.values() {
            for (i, source) in link.interfaces.iter().enumerate() {
                for target in link.interfaces.iter().skip(i + 1) {
                    if source.instance != target.instance {
                        graph.add_edge(&source.instance, &target.instance, &link.id, None);
                    }
                }
            }
        }
    }
    for links in instance.outer_links().values() {
        for link in links.values() {
            if let Some(access_point) = &link.access_point {
                for interface in &link.interfaces {
                    graph.add_edge(access_point, &interface.instance, &link.id, None);
                }
            }
        }
    }

    if graph.nodes.is_empty() {
        None
    } else {
        Some(graph)
    }
}

/// Build the graph of the PoPs and their interconnections.
///
/// * Return None if the catalog is empty.
pub fn topology_graph(catalog: &ResourceCatalog) -> Option<Graph> {
    if catalog.is_empty() {
        return None;
    }
    let mut graph = Graph::default();
    for pop in catalog.pops() {
        graph.nodes.push(GraphNode {
            id: pop.pop_name.clone(),
            kind: NodeKind::Pop,
            pop: None,
        });
    }
    for link in catalog.links() {
        graph.add_edge(&link.from, &link.to, "", link.bandwidth);
    }
    Some(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use sandman_api::descriptor::{ConnectivityType, VirtualLink};
    use sandman_api::pop_resource::PopLink;

    fn edges(graph: &Graph) -> Vec<(String, String)> {
        graph.edges.iter().map(|x| (x.source.clone(), x.target.clone())).collect()
    }

    #[test]
    fn test_no_graph_without_instance() {
        assert!(service_graph(None).is_none());
        assert!(topology_graph(&make_catalog(&[])).is_none());
    }

    #[test]
    fn test_service_graph() {
        let data = make_service_data(&[("vnf_firewall", 1.0), ("vnf_tcpdump", 1.0)]);
        let mut instance = ServiceInstance::initialize(&data, &std::collections::BTreeMap::new()).unwrap();
        instance.move_function_instance("firewall1", "A").unwrap();

        let graph = service_graph(Some(&instance)).unwrap();
        assert_eq!(4, graph.nodes.len());
        assert_eq!(Some("A".to_string()), graph.nodes[0].pop);
        assert_eq!(NodeKind::AccessPoint, graph.nodes[2].kind);
        assert_eq!(
            vec![
                ("firewall1".to_string(), "tcpdump1".to_string()),
                ("ns:input".to_string(), "firewall1".to_string()),
                ("ns:output".to_string(), "tcpdump1".to_string()),
            ],
            edges(&graph)
        );
    }

    #[test]
    fn test_multi_endpoint_link_expanded_pairwise() {
        let mut data = make_service_data(&[("vnf_a", 1.0), ("vnf_b", 1.0), ("vnf_c", 1.0)]);
        data.nsd.virtual_links.push(VirtualLink {
            id: "mgmt".to_string(),
            connectivity_type: ConnectivityType::ELan,
            connection_points_reference: vec!["vnf_a:mgmt".to_string(), "vnf_b:mgmt".to_string(), "vnf_c:mgmt".to_string()],
        });
        let instance = ServiceInstance::initialize(&data, &std::collections::BTreeMap::new()).unwrap();
        let graph = service_graph(Some(&instance)).unwrap();
        let mgmt: Vec<(String, String)> = graph
            .edges
            .iter()
            .filter(|x| x.link_id == "mgmt")
            .map(|x| (x.source.clone(), x.target.clone()))
            .collect();
        assert_eq!(
            vec![
                ("a1".to_string(), "b1".to_string()),
                ("a1".to_string(), "c1".to_string()),
                ("b1".to_string(), "c1".to_string()),
            ],
            mgmt
        );
    }

    #[test]
    fn test_dangling_links_skipped() {
        let data = make_service_data(&[("vnf_firewall", 1.0), ("vnf_tcpdump", 1.0)]);
        let mut instance = ServiceInstance::initialize(&data, &std::collections::BTreeMap::new()).unwrap();
        instance.delete_function_instance("tcpdump1").unwrap();
        let graph = service_graph(Some(&instance)).unwrap();
        assert_eq!(vec![("ns:input".to_string(), "firewall1".to_string())], edges(&graph));
    }

    #[test]
    fn test_topology_graph() {
        let catalog = crate::catalog::ResourceCatalog::new(
            vec![make_pop("A", 10.0), make_pop("B", 4.0)],
            vec![
                PopLink {
                    from: "A".to_string(),
                    to: "B".to_string(),
                    bandwidth: Some(1000.0),
                },
                PopLink {
                    from: "A".to_string(),
                    to: "Z".to_string(),
                    bandwidth: None,
                },
            ],
        );
        let graph = topology_graph(&catalog).unwrap();
        assert_eq!(2, graph.nodes.len());
        assert_eq!(vec![("A".to_string(), "B".to_string())], edges(&graph));
        assert_eq!(Some(1000.0), graph.edges[0].bandwidth);
    }
}
