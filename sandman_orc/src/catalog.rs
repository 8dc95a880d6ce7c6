// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

use sandman_api::pop_resource::{PopLink, PopResource, SystemResource};

/// Inventory of the points of presence and their capacity.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    pops: Vec<PopResource>,
    links: Vec<PopLink>,
}

impl ResourceCatalog {
    /// Create a catalog. PoPs with a name already in use are discarded.
    pub fn new(pops: Vec<PopResource>, links: Vec<PopLink>) -> Self {
        let mut unique: Vec<PopResource> = vec![];
        for pop in pops {
            if unique.iter().any(|x| x.pop_name == pop.pop_name) {
                log::warn!("Duplicate PoP {} in the resource catalog: ignored", pop.pop_name);
                continue;
            }
            unique.push(pop);
        }
        Self { pops: unique, links }
    }

    pub fn get(&self, pop_name: &str) -> Option<&PopResource> {
        self.pops.iter().find(|x| x.pop_name == pop_name)
    }

    pub fn contains(&self, pop_name: &str) -> bool {
        self.get(pop_name).is_some()
    }

    /// Names of the PoPs, in the order in which they have been configured.
    pub fn pop_names(&self) -> Vec<String> {
        self.pops.iter().map(|x| x.pop_name.clone()).collect()
    }

    pub fn pops(&self) -> &[PopResource] {
        &self.pops
    }

    pub fn links(&self) -> &[PopLink] {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.pops.is_empty()
    }

    /// Capacity left in every PoP once the requirements of all the
    /// function instances assigned in `instance` are subtracted.
    pub fn availability(
        &self,
        instance: Option<&crate::service_instance::ServiceInstance>,
    ) -> std::collections::BTreeMap<String, SystemResource> {
        let mut available: std::collections::BTreeMap<String, SystemResource> =
            self.pops.iter().map(|x| (x.pop_name.clone(), x.resources.clone())).collect();
        if let Some(instance) = instance {
            for function in instance.functions() {
                if let Some(resources) = function.pop.as_ref().and_then(|pop| available.get_mut(pop)) {
                    resources.cpu -= function.requirements.cpu;
                    resources.memory -= function.requirements.memory;
                    resources.storage -= function.requirements.storage;
                }
            }
        }
        available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_catalog_lookup() {
        let catalog = ResourceCatalog::new(vec![make_pop("B", 4.0), make_pop("A", 10.0), make_pop("B", 99.0)], vec![]);
        assert_eq!(vec!["B".to_string(), "A".to_string()], catalog.pop_names());
        assert!(catalog.contains("A"));
        assert!(!catalog.contains("a"));
        assert_eq!(4.0, catalog.get("B").unwrap().resources.cpu);
        assert!(catalog.get("C").is_none());

        let available = catalog.availability(None);
        assert_eq!(10.0, available["A"].cpu);
        assert_eq!(4.0, available["B"].cpu);
    }

    #[test]
    fn test_availability_subtracts_assigned_instances() {
        let catalog = make_catalog(&[("A", 10.0), ("B", 4.0)]);
        let data = make_service_data(&[("vnf_firewall", 3.0), ("vnf_tcpdump", 2.0)]);
        let mut instance = crate::service_instance::ServiceInstance::initialize(&data, &std::collections::BTreeMap::new()).unwrap();
        instance.move_function_instance("firewall1", "A").unwrap();
        instance.move_function_instance("tcpdump1", "A").unwrap();

        let available = catalog.availability(Some(&instance));
        assert_eq!(5.0, available["A"].cpu);
        assert_eq!(62.0, available["A"].memory);
        assert_eq!(980.0, available["A"].storage);
        assert_eq!(4.0, available["B"].cpu);
    }
}
