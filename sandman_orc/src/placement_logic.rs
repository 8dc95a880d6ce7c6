// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

use sandman_api::descriptor::{ResourceRequirements, ServiceData};
use sandman_api::pop_resource::{PopResource, SystemResource};

use crate::catalog::ResourceCatalog;
use crate::error::PlacementError;
use crate::service_instance::ServiceInstance;
use crate::PlacementStrategy;

/// The PoPs used by a service instance.
///
/// Which function instance lives where is recorded in the function
/// instances themselves. Iteration is by PoP name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementMapping {
    pop_mapping: std::collections::BTreeMap<String, PopResource>,
}

impl PlacementMapping {
    /// Build the mapping containing exactly the PoPs that host at least one
    /// function instance. PoPs unknown to the catalog are left out.
    pub fn from_instance(instance: &ServiceInstance, catalog: &ResourceCatalog) -> Self {
        let mut pop_mapping = std::collections::BTreeMap::new();
        for pop_name in instance.used_pops() {
            match catalog.get(&pop_name) {
                Some(pop) => {
                    pop_mapping.insert(pop_name, pop.clone());
                }
                None => log::error!("Function instances assigned to PoP {} that is not in the catalog", pop_name),
            }
        }
        Self { pop_mapping }
    }

    pub fn pops(&self) -> Vec<&PopResource> {
        self.pop_mapping.values().collect()
    }

    pub fn pop_names(&self) -> Vec<String> {
        self.pop_mapping.keys().cloned().collect()
    }

    pub fn get(&self, pop_name: &str) -> Option<&PopResource> {
        self.pop_mapping.get(pop_name)
    }

    pub fn contains(&self, pop_name: &str) -> bool {
        self.pop_mapping.contains_key(pop_name)
    }

    pub fn is_empty(&self) -> bool {
        self.pop_mapping.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pop_mapping.len()
    }
}

/// Scaling and placement policy.
pub trait PlacementPlugin: Send + Sync {
    /// Decide the number of replicas of every function and create the
    /// service instance, with no function instance placed yet.
    fn initial_scaling(&self, data: &ServiceData) -> Result<ServiceInstance, PlacementError>;

    /// Assign every function instance to exactly one PoP.
    ///
    /// Either all the function instances are placed or the service instance
    /// is left unchanged.
    fn initial_placement(&self, instance: &mut ServiceInstance, catalog: &ResourceCatalog) -> Result<PlacementMapping, PlacementError>;
}

/// Return true if the requirements can be satisfied by the resources.
pub fn fits(requirements: &ResourceRequirements, available: &SystemResource) -> bool {
    available.cpu >= requirements.cpu && available.memory >= requirements.memory && available.storage >= requirements.storage
}

/// Capacity-aware placement logic with a configurable strategy.
pub struct PlacementLogic {
    strategy: PlacementStrategy,
    // key: vnf_id, value: initial number of instances
    replicas: std::collections::BTreeMap<String, u32>,
}

impl PlacementLogic {
    pub fn new(strategy: PlacementStrategy, replicas: std::collections::BTreeMap<String, u32>) -> Self {
        match strategy {
            PlacementStrategy::GreedyBestFit => log::info!("Placement strategy: greedy best-fit"),
            PlacementStrategy::FirstFit => log::info!("Placement strategy: first-fit"),
        };
        Self { strategy, replicas }
    }

    /// Select the PoP where to place a function instance with the given
    /// requirements, among those with enough available resources.
    ///
    /// With equal capacity the PoP with the smallest name wins.
    pub fn select_pop(
        &self,
        requirements: &ResourceRequirements,
        available: &std::collections::BTreeMap<String, SystemResource>,
    ) -> Option<String> {
        let mut candidates = available.iter().filter(|(_, resources)| fits(requirements, resources));
        match self.strategy {
            PlacementStrategy::GreedyBestFit => {
                let mut best: Option<(&String, &SystemResource)> = None;
                for (pop_name, resources) in candidates {
                    match best {
                        Some((_, best_resources)) if best_resources.cpu >= resources.cpu => {}
                        _ => best = Some((pop_name, resources)),
                    }
                }
                best.map(|(pop_name, _)| pop_name.clone())
            }
            PlacementStrategy::FirstFit => candidates.next().map(|(pop_name, _)| pop_name.clone()),
        }
    }
}

impl PlacementPlugin for PlacementLogic {
    fn initial_scaling(&self, data: &ServiceData) -> Result<ServiceInstance, PlacementError> {
        ServiceInstance::initialize(data, &self.replicas)
    }

    fn initial_placement(&self, instance: &mut ServiceInstance, catalog: &ResourceCatalog) -> Result<PlacementMapping, PlacementError> {
        let mut available = catalog.availability(None);
        let mut decisions = vec![];
        for function in instance.functions() {
            match self.select_pop(&function.requirements, &available) {
                Some(pop_name) => {
                    if let Some(resources) = available.get_mut(&pop_name) {
                        resources.cpu -= function.requirements.cpu;
                        resources.memory -= function.requirements.memory;
                        resources.storage -= function.requirements.storage;
                    }
                    log::debug!("Function instance {} placed on {}", function.name, pop_name);
                    decisions.push((function.name.clone(), pop_name));
                }
                None => {
                    log::debug!(
                        "No PoP can host function instance {} of service {}: placement aborted",
                        function.name,
                        instance.service_name
                    );
                    return Err(PlacementError::InsufficientCapacity {
                        instance: function.name.clone(),
                        cpu: function.requirements.cpu,
                        memory: function.requirements.memory,
                        storage: function.requirements.storage,
                    });
                }
            }
        }

        for (name, pop_name) in decisions {
            instance.move_function_instance(&name, &pop_name)?;
        }
        let mapping = PlacementMapping::from_instance(instance, catalog);
        log::info!(
            "Service {} placed on {} PoP(s): {}",
            instance.service_name,
            mapping.len(),
            mapping.pop_names().join(",")
        );
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn assignments(instance: &ServiceInstance) -> Vec<(String, String)> {
        instance
            .functions()
            .iter()
            .map(|x| (x.name.clone(), x.pop.clone().unwrap_or_default()))
            .collect()
    }

    #[test]
    fn test_greedy_best_fit_two_functions() {
        let logic = PlacementLogic::new(PlacementStrategy::GreedyBestFit, std::collections::BTreeMap::new());
        let catalog = make_catalog(&[("A", 10.0), ("B", 4.0)]);
        let data = make_service_data(&[("vnf_firewall", 3.0), ("vnf_tcpdump", 3.0)]);

        let mut instance = logic.initial_scaling(&data).unwrap();
        let mapping = logic.initial_placement(&mut instance, &catalog).unwrap();
        assert_eq!(
            vec![("firewall1".to_string(), "A".to_string()), ("tcpdump1".to_string(), "A".to_string())],
            assignments(&instance)
        );
        assert_eq!(vec!["A".to_string()], mapping.pop_names());
    }

    #[test]
    fn test_greedy_best_fit_spreads_when_needed() {
        let logic = PlacementLogic::new(PlacementStrategy::GreedyBestFit, std::collections::BTreeMap::new());
        let catalog = make_catalog(&[("A", 5.0), ("B", 4.0)]);
        let data = make_service_data(&[("vnf_firewall", 3.0), ("vnf_tcpdump", 3.0)]);

        let mut instance = logic.initial_scaling(&data).unwrap();
        let mapping = logic.initial_placement(&mut instance, &catalog).unwrap();
        assert_eq!(
            vec![("firewall1".to_string(), "A".to_string()), ("tcpdump1".to_string(), "B".to_string())],
            assignments(&instance)
        );
        assert_eq!(vec!["A".to_string(), "B".to_string()], mapping.pop_names());
    }

    #[test]
    fn test_tie_break_smallest_name() {
        let logic = PlacementLogic::new(PlacementStrategy::GreedyBestFit, std::collections::BTreeMap::new());
        let catalog = make_catalog(&[("pop-c", 8.0), ("pop-a", 8.0), ("pop-b", 8.0)]);
        let data = make_service_data(&[("vnf_firewall", 1.0)]);

        let mut instance = logic.initial_scaling(&data).unwrap();
        logic.initial_placement(&mut instance, &catalog).unwrap();
        assert_eq!(Some("pop-a".to_string()), instance.function("firewall1").unwrap().pop);
    }

    #[test]
    fn test_insufficient_capacity_is_all_or_nothing() {
        let logic = PlacementLogic::new(PlacementStrategy::GreedyBestFit, std::collections::BTreeMap::new());
        let catalog = make_catalog(&[("A", 2.0)]);
        let data = make_service_data(&[("vnf_small", 1.0), ("vnf_firewall", 3.0)]);

        let mut instance = logic.initial_scaling(&data).unwrap();
        match logic.initial_placement(&mut instance, &catalog) {
            Err(PlacementError::InsufficientCapacity { instance, cpu, .. }) => {
                assert_eq!("firewall1", instance);
                assert_eq!(3.0, cpu);
            }
            _ => panic!("expected insufficient capacity"),
        }
        // The first function would have fit, but nothing is committed.
        assert!(instance.functions().iter().all(|x| x.pop.is_none()));
    }

    #[test]
    fn test_placement_is_deterministic() {
        let logic = PlacementLogic::new(
            PlacementStrategy::GreedyBestFit,
            std::collections::BTreeMap::from([("vnf_firewall".to_string(), 3)]),
        );
        let catalog = make_catalog(&[("A", 4.0), ("B", 4.0), ("C", 6.0)]);
        let data = make_service_data(&[("vnf_firewall", 2.0), ("vnf_tcpdump", 1.0), ("vnf_nat", 3.0)]);

        let mut first = logic.initial_scaling(&data).unwrap();
        let first_mapping = logic.initial_placement(&mut first, &catalog).unwrap();
        let mut second = logic.initial_scaling(&data).unwrap();
        let second_mapping = logic.initial_placement(&mut second, &catalog).unwrap();
        assert_eq!(assignments(&first), assignments(&second));
        assert_eq!(first_mapping, second_mapping);
    }

    #[test]
    fn test_first_fit() {
        let logic = PlacementLogic::new(PlacementStrategy::FirstFit, std::collections::BTreeMap::new());
        let catalog = make_catalog(&[("B", 10.0), ("A", 4.0)]);
        let data = make_service_data(&[("vnf_firewall", 3.0), ("vnf_tcpdump", 3.0)]);

        let mut instance = logic.initial_scaling(&data).unwrap();
        logic.initial_placement(&mut instance, &catalog).unwrap();
        assert_eq!(
            vec![("firewall1".to_string(), "A".to_string()), ("tcpdump1".to_string(), "B".to_string())],
            assignments(&instance)
        );
    }

    #[test]
    fn test_mapping_skips_unknown_pops() {
        let catalog = make_catalog(&[("A", 10.0)]);
        let data = make_service_data(&[("vnf_firewall", 3.0), ("vnf_tcpdump", 3.0)]);
        let mut instance = ServiceInstance::initialize(&data, &std::collections::BTreeMap::new()).unwrap();
        instance.move_function_instance("firewall1", "A").unwrap();
        instance.move_function_instance("tcpdump1", "Z").unwrap();
        let mapping = PlacementMapping::from_instance(&instance, &catalog);
        assert_eq!(vec!["A".to_string()], mapping.pop_names());
        assert!(mapping.contains("A"));
        assert!(!mapping.contains("Z"));
    }
}
