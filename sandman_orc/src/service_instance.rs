// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

use sandman_api::descriptor::{LinkEndpoint, ResourceRequirements, ServiceData, ServiceDescriptor, VnfDescriptor, VNF_PREFIX};

use crate::error::PlacementError;

/// One running (or pending) replica of a network function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInstance {
    /// Name of the instance, unique within the service instance,
    /// e.g., `firewall1`.
    pub name: String,
    /// Identifier of the function in the service descriptor,
    /// e.g., `vnf_firewall`.
    pub vnf_id: String,
    pub descriptor: VnfDescriptor,
    pub requirements: ResourceRequirements,
    /// PoP where the instance lives, None until it is placed.
    pub pop: Option<String>,
    // Creation order, used to iterate in declaration order.
    seq: u64,
}

impl FunctionInstance {
    /// Name used to refer to this instance in link endpoints.
    pub fn reference(&self) -> String {
        instance_reference(&self.name)
    }
}

/// Name used to refer to a function instance in link endpoints, e.g.,
/// `vnf_firewall1`.
pub fn instance_reference(instance_name: &str) -> String {
    format!("{}{}", VNF_PREFIX, instance_name)
}

/// Key of a link between two endpoints, within a link group.
pub fn link_key(source: &str, target: &str) -> String {
    format!("{}-{}", source, target)
}

/// Key of the link between an access point and a function instance,
/// whatever the direction of the traffic.
pub fn outer_link_key(access_point: &str, instance_name: &str) -> String {
    link_key(access_point, &instance_reference(instance_name))
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkInterface {
    pub instance: String,
    pub port: String,
}

/// A realized virtual link.
///
/// Inner links connect two or more function instances, outer links connect
/// function instances to a service access point.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkInstance {
    /// Identifier of the virtual link realized.
    pub id: String,
    pub interfaces: Vec<LinkInterface>,
    pub access_point: Option<String>,
    /// Intermediate nodes the traffic must traverse, in order.
    pub via_path: Vec<String>,
}

/// Maps: link group -> link key -> link.
pub type LinkMap = std::collections::BTreeMap<String, std::collections::BTreeMap<String, LinkInstance>>;

/// The running realization of a service description.
#[derive(Debug, Clone)]
pub struct ServiceInstance {
    pub service_name: String,
    pub service: ServiceDescriptor,
    // key: vnf_id
    vnfds: std::collections::BTreeMap<String, VnfDescriptor>,
    // key: instance name
    functions: std::collections::BTreeMap<String, FunctionInstance>,
    inner_links: LinkMap,
    // key of the outer map: access point
    outer_links: LinkMap,
    // key: vnf_id, value: last instance counter used
    counters: std::collections::BTreeMap<String, u32>,
    next_seq: u64,
}

impl ServiceInstance {
    /// Build a service instance with `replicas` instances of every function
    /// (1 if not specified) and all the links declared in the service.
    ///
    /// Instances are not assigned to any PoP.
    pub fn initialize(data: &ServiceData, replicas: &std::collections::BTreeMap<String, u32>) -> Result<Self, PlacementError> {
        let mut vnfds = std::collections::BTreeMap::new();
        for function in &data.nsd.network_functions {
            match data.vnfd(function) {
                Some(vnfd) => {
                    vnfds.insert(function.vnf_id.clone(), vnfd.clone());
                }
                None => {
                    log::debug!(
                        "No descriptor for {} ({}, {}, {})",
                        function.vnf_id,
                        function.vnf_vendor,
                        function.vnf_name,
                        function.vnf_version
                    );
                    return Err(PlacementError::UnknownVnf(function.vnf_id.clone()));
                }
            }
        }

        let mut instance = Self {
            service_name: data.nsd.name.clone(),
            service: data.nsd.clone(),
            vnfds,
            functions: std::collections::BTreeMap::new(),
            inner_links: LinkMap::new(),
            outer_links: LinkMap::new(),
            counters: std::collections::BTreeMap::new(),
            next_seq: 0,
        };

        for function in &data.nsd.network_functions {
            let num = replicas.get(&function.vnf_id).copied().unwrap_or(1).max(1);
            for _ in 0..num {
                instance.add_function_instance(&function.vnf_id, None)?;
            }
        }

        for vl in &data.nsd.virtual_links {
            let endpoints: Vec<LinkEndpoint> = vl.connection_points_reference.iter().map(|x| LinkEndpoint::parse(x)).collect();
            for endpoint in &endpoints {
                let known = match endpoint {
                    LinkEndpoint::Function(vnf_id, _) => instance.vnfds.contains_key(vnf_id),
                    LinkEndpoint::AccessPoint(id) => data.has_access_point(id),
                };
                if !known {
                    log::debug!("Virtual link {} refers to an unknown endpoint {}", vl.id, endpoint);
                    return Err(PlacementError::UnknownEndpoint(endpoint.to_string()));
                }
            }

            let function_endpoints: Vec<(String, String)> = endpoints
                .iter()
                .filter_map(|x| match x {
                    LinkEndpoint::Function(vnf_id, port) => Some((vnf_id.clone(), port.clone())),
                    LinkEndpoint::AccessPoint(_) => None,
                })
                .collect();

            // Access points: one outer link per function instance.
            for access_point in endpoints.iter().filter_map(|x| match x {
                LinkEndpoint::AccessPoint(id) => Some(id.clone()),
                LinkEndpoint::Function(_, _) => None,
            }) {
                for (vnf_id, port) in &function_endpoints {
                    for name in instance.instances_of(vnf_id) {
                        instance.outer_links.entry(access_point.clone()).or_default().insert(
                            outer_link_key(&access_point, &name),
                            LinkInstance {
                                id: vl.id.clone(),
                                interfaces: vec![LinkInterface {
                                    instance: name.clone(),
                                    port: port.clone(),
                                }],
                                access_point: Some(access_point.clone()),
                                via_path: vec![],
                            },
                        );
                    }
                }
            }

            // Functions: one inner link per pair of instances, multipoint
            // links included.
            for (i, (src_vnf, src_port)) in function_endpoints.iter().enumerate() {
                for (dst_vnf, dst_port) in function_endpoints.iter().skip(i + 1) {
                    let targets = instance.instances_of(dst_vnf);
                    for source in instance.instances_of(src_vnf) {
                        for target in targets.iter().filter(|x| **x != source) {
                            instance.inner_links.entry(vl.id.clone()).or_default().insert(
                                link_key(&instance_reference(&source), &instance_reference(target)),
                                LinkInstance {
                                    id: vl.id.clone(),
                                    interfaces: vec![
                                        LinkInterface {
                                            instance: source.clone(),
                                            port: src_port.clone(),
                                        },
                                        LinkInterface {
                                            instance: target.clone(),
                                            port: dst_port.clone(),
                                        },
                                    ],
                                    access_point: None,
                                    via_path: vec![],
                                },
                            );
                        }
                    }
                }
            }
        }

        log::info!(
            "Initialized service instance {}: {} function instances, {} inner link groups, {} outer link groups",
            instance.service_name,
            instance.functions.len(),
            instance.inner_links.len(),
            instance.outer_links.len()
        );
        Ok(instance)
    }

    fn instances_of(&self, vnf_id: &str) -> Vec<String> {
        self.functions().into_iter().filter(|x| x.vnf_id == vnf_id).map(|x| x.name.clone()).collect()
    }

    /// Add a new instance of a function of this service.
    ///
    /// * `vnf_id` - The identifier of the function in the service.
    /// * `pop` - The PoP to which the new instance is assigned, if any.
    ///
    /// * Return the name of the new instance.
    ///
    /// The PoP is not checked against the resource catalog, see
    /// `PlacementManager::add_function_instance`.
    pub(crate) fn add_function_instance(&mut self, vnf_id: &str, pop: Option<String>) -> Result<String, PlacementError> {
        let descriptor = match self.vnfds.get(vnf_id) {
            Some(descriptor) => descriptor.clone(),
            None => return Err(PlacementError::UnknownVnf(vnf_id.to_string())),
        };
        let base = vnf_id.strip_prefix(VNF_PREFIX).unwrap_or(vnf_id).to_string();
        let counter = self.counters.entry(vnf_id.to_string()).or_insert(0);
        let name = loop {
            *counter += 1;
            let candidate = format!("{}{}", base, counter);
            if !self.functions.contains_key(&candidate) {
                break candidate;
            }
        };
        self.next_seq += 1;
        self.functions.insert(
            name.clone(),
            FunctionInstance {
                name: name.clone(),
                vnf_id: vnf_id.to_string(),
                requirements: descriptor.resource_requirements(),
                descriptor,
                pop,
                seq: self.next_seq,
            },
        );
        log::debug!("New function instance {} of {}", name, vnf_id);
        Ok(name)
    }

    /// Remove a function instance.
    ///
    /// Links referring to the instance are not removed.
    pub fn delete_function_instance(&mut self, instance_name: &str) -> Result<FunctionInstance, PlacementError> {
        match self.functions.remove(instance_name) {
            Some(function) => {
                log::debug!("Deleted function instance {}", instance_name);
                Ok(function)
            }
            None => Err(PlacementError::UnknownInstance(instance_name.to_string())),
        }
    }

    /// Assign a function instance to another PoP, leaving its links intact.
    ///
    /// * Return the previous PoP, if any.
    ///
    /// The PoP is not checked against the resource catalog, see
    /// `PlacementManager::move_function_instance`.
    pub(crate) fn move_function_instance(&mut self, instance_name: &str, pop_name: &str) -> Result<Option<String>, PlacementError> {
        match self.functions.get_mut(instance_name) {
            Some(function) => Ok(function.pop.replace(pop_name.to_string())),
            None => Err(PlacementError::UnknownInstance(instance_name.to_string())),
        }
    }

    /// Add (or replace) a link from a source to a target.
    ///
    /// Both can be the names of function instances. One of them can be an
    /// access point declared by the service, in which case the link is an
    /// outer one.
    pub fn add_link(&mut self, source: &str, target: &str, via_path: Vec<String>) -> Result<(), PlacementError> {
        match (self.access_point(source), self.access_point(target)) {
            (None, None) => {
                let src_vnf = self.require_vnf_id(source)?;
                let dst_vnf = self.require_vnf_id(target)?;
                let (group, src_port, dst_port) = self.declared_inner_link(&src_vnf, &dst_vnf).unwrap_or((
                    link_key(&src_vnf, &dst_vnf),
                    "output".to_string(),
                    "input".to_string(),
                ));
                self.inner_links.entry(group.clone()).or_default().insert(
                    link_key(&instance_reference(source), &instance_reference(target)),
                    LinkInstance {
                        id: group,
                        interfaces: vec![
                            LinkInterface {
                                instance: source.to_string(),
                                port: src_port,
                            },
                            LinkInterface {
                                instance: target.to_string(),
                                port: dst_port,
                            },
                        ],
                        access_point: None,
                        via_path,
                    },
                );
            }
            (Some(access_point), None) | (None, Some(access_point)) => {
                let function = if access_point == source { target } else { source };
                let vnf_id = self.require_vnf_id(function)?;
                let (id, port) = self.declared_outer_link(&access_point, &vnf_id).unwrap_or((
                    link_key(&access_point, &vnf_id),
                    "input".to_string(),
                ));
                self.outer_links.entry(access_point.clone()).or_default().insert(
                    outer_link_key(&access_point, function),
                    LinkInstance {
                        id,
                        interfaces: vec![LinkInterface {
                            instance: function.to_string(),
                            port,
                        }],
                        access_point: Some(access_point),
                        via_path,
                    },
                );
            }
            (Some(_), Some(_)) => {
                return Err(PlacementError::UnknownInstance(format!("{}/{}", source, target)));
            }
        }
        log::debug!("Added link {} -> {}", source, target);
        Ok(())
    }

    /// Remove the link from a source to a target, added either by
    /// `add_link` or when initializing from an E-Line virtual link.
    ///
    /// * Return true if a link has been removed.
    pub fn delete_link(&mut self, source: &str, target: &str) -> Result<bool, PlacementError> {
        let (links, group_filter) = match (self.access_point(source), self.access_point(target)) {
            (None, None) => {
                self.require_vnf_id(source)?;
                self.require_vnf_id(target)?;
                (&mut self.inner_links, None)
            }
            (Some(access_point), None) => {
                self.require_vnf_id(target)?;
                (&mut self.outer_links, Some(access_point))
            }
            (None, Some(access_point)) => {
                self.require_vnf_id(source)?;
                (&mut self.outer_links, Some(access_point))
            }
            (Some(_), Some(_)) => return Err(PlacementError::UnknownInstance(format!("{}/{}", source, target))),
        };
        let key = match &group_filter {
            Some(access_point) if access_point == source => outer_link_key(access_point, target),
            Some(access_point) => outer_link_key(access_point, source),
            None => link_key(&instance_reference(source), &instance_reference(target)),
        };
        let mut removed = false;
        for (group, group_links) in links.iter_mut() {
            if group_filter.as_ref().is_some_and(|x| x != group) {
                continue;
            }
            removed |= group_links.remove(&key).is_some();
        }
        links.retain(|_, group_links| !group_links.is_empty());
        if removed {
            log::debug!("Deleted link {} -> {}", source, target);
        } else {
            log::warn!("No link {} -> {} to be deleted", source, target);
        }
        Ok(removed)
    }

    fn require_vnf_id(&self, instance_name: &str) -> Result<String, PlacementError> {
        match self.find_vnf_id(instance_name) {
            Some(vnf_id) => Ok(vnf_id.to_string()),
            None => Err(PlacementError::UnknownInstance(instance_name.to_string())),
        }
    }

    fn access_point(&self, name: &str) -> Option<String> {
        self.service.connection_points.iter().find(|x| x.id == name).map(|x| x.id.clone())
    }

    // Virtual link of the service between two functions: (id, source port, target port).
    fn declared_inner_link(&self, src_vnf: &str, dst_vnf: &str) -> Option<(String, String, String)> {
        self.service.virtual_links.iter().find_map(|vl| {
            let endpoints: Vec<LinkEndpoint> = vl.connection_points_reference.iter().map(|x| LinkEndpoint::parse(x)).collect();
            let port_of = |wanted: &str, skip: Option<usize>| {
                endpoints.iter().enumerate().find_map(|(pos, x)| match x {
                    LinkEndpoint::Function(vnf_id, port) if vnf_id == wanted && Some(pos) != skip => Some((pos, port.clone())),
                    _ => None,
                })
            };
            let (src_pos, src_port) = port_of(src_vnf, None)?;
            let (_, dst_port) = port_of(dst_vnf, Some(src_pos))?;
            Some((vl.id.clone(), src_port, dst_port))
        })
    }

    // Virtual link of the service between an access point and a function: (id, function port).
    fn declared_outer_link(&self, access_point: &str, vnf_id: &str) -> Option<(String, String)> {
        self.service.virtual_links.iter().find_map(|vl| {
            let endpoints: Vec<LinkEndpoint> = vl.connection_points_reference.iter().map(|x| LinkEndpoint::parse(x)).collect();
            if !endpoints.contains(&LinkEndpoint::AccessPoint(access_point.to_string())) {
                return None;
            }
            endpoints.iter().find_map(|x| match x {
                LinkEndpoint::Function(id, port) if id == vnf_id => Some((vl.id.clone(), port.clone())),
                _ => None,
            })
        })
    }

    /// Reverse lookup of the function identifier of an instance.
    pub fn find_vnf_id(&self, instance_name: &str) -> Option<&str> {
        self.functions.get(instance_name).map(|x| x.vnf_id.as_str())
    }

    pub fn function(&self, instance_name: &str) -> Option<&FunctionInstance> {
        self.functions.get(instance_name)
    }

    /// All the function instances, in creation order.
    pub fn functions(&self) -> Vec<&FunctionInstance> {
        let mut functions: Vec<&FunctionInstance> = self.functions.values().collect();
        functions.sort_by_key(|x| x.seq);
        functions
    }

    pub fn num_functions(&self) -> usize {
        self.functions.len()
    }

    pub fn vnfd(&self, vnf_id: &str) -> Option<&VnfDescriptor> {
        self.vnfds.get(vnf_id)
    }

    pub fn inner_links(&self) -> &LinkMap {
        &self.inner_links
    }

    pub fn outer_links(&self) -> &LinkMap {
        &self.outer_links
    }

    /// Names of the PoPs that host at least one function instance.
    pub fn used_pops(&self) -> std::collections::BTreeSet<String> {
        self.functions.values().filter_map(|x| x.pop.clone()).collect()
    }

    /// Function instances assigned to a given PoP, in creation order.
    pub fn instances_on(&self, pop_name: &str) -> Vec<&FunctionInstance> {
        self.functions().into_iter().filter(|x| x.pop.as_deref() == Some(pop_name)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_initialize_service_instance() {
        let data = make_service_data(&[("vnf_firewall", 1.0), ("vnf_tcpdump", 2.0)]);
        let instance = ServiceInstance::initialize(&data, &std::collections::BTreeMap::new()).unwrap();

        assert_eq!("test-service", instance.service_name);
        assert_eq!(
            vec!["firewall1", "tcpdump1"],
            instance.functions().iter().map(|x| x.name.as_str()).collect::<Vec<&str>>()
        );
        assert_eq!(Some("vnf_tcpdump"), instance.find_vnf_id("tcpdump1"));
        assert_eq!(None, instance.find_vnf_id("vnf_tcpdump"));
        assert_eq!(None, instance.find_vnf_id("Tcpdump1"));
        assert!(instance.functions().iter().all(|x| x.pop.is_none()));
        assert_eq!(2.0, instance.function("tcpdump1").unwrap().requirements.cpu);

        // ns:input -> firewall, firewall -> tcpdump, tcpdump -> ns:output
        assert_eq!(1, instance.inner_links().len());
        let chain = &instance.inner_links()["link-1"];
        assert!(chain.contains_key("vnf_firewall1-vnf_tcpdump1"));
        assert_eq!(2, instance.outer_links().len());
        let input = &instance.outer_links()["ns:input"]["ns:input-vnf_firewall1"];
        assert_eq!("link-0", input.id);
        assert_eq!("firewall1", input.interfaces[0].instance);
        let output = &instance.outer_links()["ns:output"]["ns:output-vnf_tcpdump1"];
        assert_eq!("link-2", output.id);
        assert_eq!("output", output.interfaces[0].port);
    }

    #[test]
    fn test_initialize_with_replicas() {
        let data = make_service_data(&[("vnf_firewall", 1.0), ("vnf_tcpdump", 2.0)]);
        let replicas = std::collections::BTreeMap::from([("vnf_firewall".to_string(), 2)]);
        let instance = ServiceInstance::initialize(&data, &replicas).unwrap();
        assert_eq!(3, instance.num_functions());
        let chain = &instance.inner_links()["link-1"];
        assert_eq!(2, chain.len());
        assert!(chain.contains_key("vnf_firewall2-vnf_tcpdump1"));
        assert_eq!(
            vec!["ns:input-vnf_firewall1", "ns:input-vnf_firewall2"],
            instance.outer_links()["ns:input"].keys().map(|x| x.as_str()).collect::<Vec<&str>>()
        );
    }

    #[test]
    fn test_initialize_undefined_function() {
        let mut data = make_service_data(&[("vnf_firewall", 1.0)]);
        data.vnfds.clear();
        assert_eq!(
            Err(PlacementError::UnknownVnf("vnf_firewall".to_string())),
            ServiceInstance::initialize(&data, &std::collections::BTreeMap::new()).map(|_| ())
        );

        let mut data = make_service_data(&[("vnf_firewall", 1.0)]);
        data.nsd.virtual_links[0].connection_points_reference[1] = "vnf_ghost:input".to_string();
        assert_eq!(
            Err(PlacementError::UnknownEndpoint("vnf_ghost:input".to_string())),
            ServiceInstance::initialize(&data, &std::collections::BTreeMap::new()).map(|_| ())
        );
    }

    #[test]
    fn test_add_delete_function_instance() {
        let data = make_service_data(&[("vnf_firewall", 1.0)]);
        let mut instance = ServiceInstance::initialize(&data, &std::collections::BTreeMap::new()).unwrap();

        assert_eq!(Err(PlacementError::UnknownVnf("vnf_ghost".to_string())), instance.add_function_instance("vnf_ghost", None));

        let name = instance.add_function_instance("vnf_firewall", Some("A".to_string())).unwrap();
        assert_eq!("firewall2", name);
        assert_eq!(Some("A".to_string()), instance.function(&name).unwrap().pop);

        instance.delete_function_instance("firewall2").unwrap();
        assert_eq!(
            Err(PlacementError::UnknownInstance("firewall2".to_string())),
            instance.delete_function_instance("firewall2").map(|_| ())
        );

        // Names are never reused.
        assert_eq!("firewall3", instance.add_function_instance("vnf_firewall", None).unwrap());
    }

    #[test]
    fn test_delete_instance_keeps_links() {
        let data = make_service_data(&[("vnf_firewall", 1.0), ("vnf_tcpdump", 2.0)]);
        let mut instance = ServiceInstance::initialize(&data, &std::collections::BTreeMap::new()).unwrap();
        instance.delete_function_instance("tcpdump1").unwrap();
        assert!(instance.inner_links()["link-1"].contains_key("vnf_firewall1-vnf_tcpdump1"));
    }

    #[test]
    fn test_move_function_instance() {
        let data = make_service_data(&[("vnf_firewall", 1.0)]);
        let mut instance = ServiceInstance::initialize(&data, &std::collections::BTreeMap::new()).unwrap();
        assert_eq!(Ok(None), instance.move_function_instance("firewall1", "A"));
        assert_eq!(Ok(Some("A".to_string())), instance.move_function_instance("firewall1", "B"));
        assert_eq!(
            Err(PlacementError::UnknownInstance("firewall9".to_string())),
            instance.move_function_instance("firewall9", "B")
        );
        assert_eq!(std::collections::BTreeSet::from(["B".to_string()]), instance.used_pops());
    }

    #[test]
    fn test_add_delete_link() {
        let data = make_service_data(&[("vnf_firewall", 1.0), ("vnf_tcpdump", 2.0)]);
        let mut instance = ServiceInstance::initialize(&data, &std::collections::BTreeMap::new()).unwrap();
        let new_name = instance.add_function_instance("vnf_tcpdump", None).unwrap();

        instance.add_link("firewall1", &new_name, vec!["s1".to_string(), "s2".to_string()]).unwrap();
        let link = &instance.inner_links()["link-1"]["vnf_firewall1-vnf_tcpdump2"];
        assert_eq!(vec!["s1".to_string(), "s2".to_string()], link.via_path);
        assert_eq!("output", link.interfaces[0].port);
        assert_eq!("input", link.interfaces[1].port);

        assert_eq!(
            Err(PlacementError::UnknownInstance("ghost1".to_string())),
            instance.add_link("firewall1", "ghost1", vec![])
        );

        assert_eq!(Ok(true), instance.delete_link("firewall1", &new_name));
        assert_eq!(Ok(false), instance.delete_link("firewall1", &new_name));
        assert_eq!(1, instance.inner_links()["link-1"].len());
    }

    #[test]
    fn test_delete_link_on_deleted_instance() {
        let data = make_service_data(&[("vnf_firewall", 1.0), ("vnf_tcpdump", 2.0)]);
        let mut instance = ServiceInstance::initialize(&data, &std::collections::BTreeMap::new()).unwrap();
        instance.delete_function_instance("tcpdump1").unwrap();
        let inner_before = instance.inner_links().clone();
        let outer_before = instance.outer_links().clone();

        assert_eq!(
            Err(PlacementError::UnknownInstance("tcpdump1".to_string())),
            instance.delete_link("firewall1", "tcpdump1")
        );
        assert_eq!(&inner_before, instance.inner_links());
        assert_eq!(&outer_before, instance.outer_links());
    }

    #[test]
    fn test_initial_links_deleted_before_instance() {
        let data = make_service_data(&[("vnf_firewall", 1.0), ("vnf_tcpdump", 2.0)]);
        let mut instance = ServiceInstance::initialize(&data, &std::collections::BTreeMap::new()).unwrap();

        assert_eq!(Ok(true), instance.delete_link("ns:input", "firewall1"));
        assert_eq!(Ok(true), instance.delete_link("firewall1", "tcpdump1"));
        // Outer links can be referred to in either direction.
        assert_eq!(Ok(true), instance.delete_link("tcpdump1", "ns:output"));
        assert!(instance.inner_links().is_empty());
        assert!(instance.outer_links().is_empty());

        instance.delete_function_instance("firewall1").unwrap();
        instance.delete_function_instance("tcpdump1").unwrap();
        assert_eq!(0, instance.num_functions());
    }

    #[test]
    fn test_multipoint_link_keyed_by_pair() {
        let mut data = make_service_data(&[("vnf_a", 1.0), ("vnf_b", 1.0), ("vnf_c", 1.0)]);
        data.nsd.virtual_links.push(sandman_api::descriptor::VirtualLink {
            id: "mgmt".to_string(),
            connectivity_type: sandman_api::descriptor::ConnectivityType::ELan,
            connection_points_reference: vec!["vnf_a:mgmt".to_string(), "vnf_b:mgmt".to_string(), "vnf_c:mgmt".to_string()],
        });
        let mut instance = ServiceInstance::initialize(&data, &std::collections::BTreeMap::new()).unwrap();
        assert_eq!(
            vec!["vnf_a1-vnf_b1", "vnf_a1-vnf_c1", "vnf_b1-vnf_c1"],
            instance.inner_links()["mgmt"].keys().map(|x| x.as_str()).collect::<Vec<&str>>()
        );

        assert_eq!(Ok(true), instance.delete_link("a1", "c1"));
        assert_eq!(2, instance.inner_links()["mgmt"].len());
    }

    #[test]
    fn test_outer_link() {
        let data = make_service_data(&[("vnf_firewall", 1.0), ("vnf_tcpdump", 2.0)]);
        let mut instance = ServiceInstance::initialize(&data, &std::collections::BTreeMap::new()).unwrap();
        let new_name = instance.add_function_instance("vnf_firewall", None).unwrap();

        instance.add_link("ns:input", &new_name, vec![]).unwrap();
        let links = &instance.outer_links()["ns:input"];
        let link = &links["ns:input-vnf_firewall2"];
        assert_eq!("link-0", link.id);
        assert_eq!("input", link.interfaces[0].port);

        assert_eq!(Ok(true), instance.delete_link("ns:input", &new_name));
        assert_eq!(1, instance.outer_links()["ns:input"].len());
    }
}
