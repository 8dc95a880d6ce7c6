// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

use sandman_api::descriptor::ResourceRequirements;
use sandman_api::pop_resource::SystemResource;

use crate::catalog::ResourceCatalog;
use crate::error::PlacementError;
use crate::monitor::MonitorHandle;
use crate::placement_logic::{fits, PlacementMapping};
use crate::service_instance::ServiceInstance;

/// Incremental change to a placed service instance.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum PlacementAction {
    AddInstance { vnf_id: String, pop: String },
    MoveInstance { instance: String, pop: String },
    DeleteInstance { instance: String },
    AddLink { source: String, target: String, via_path: Vec<String> },
    DeleteLink { source: String, target: String },
}

impl std::fmt::Display for PlacementAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementAction::AddInstance { vnf_id, pop } => write!(f, "add instance of {} on {}", vnf_id, pop),
            PlacementAction::MoveInstance { instance, pop } => write!(f, "move {} to {}", instance, pop),
            PlacementAction::DeleteInstance { instance } => write!(f, "delete {}", instance),
            PlacementAction::AddLink { source, target, .. } => write!(f, "add link {} -> {}", source, target),
            PlacementAction::DeleteLink { source, target } => write!(f, "delete link {} -> {}", source, target),
        }
    }
}

/// Incremental placement operations and resource queries.
///
/// Capacity is checked only on the PoP affected by an operation, the other
/// instances are never re-placed.
#[derive(Clone)]
pub struct PlacementManager {
    catalog: ResourceCatalog,
    monitor: MonitorHandle,
}

impl PlacementManager {
    pub fn new(catalog: ResourceCatalog, monitor: MonitorHandle) -> Self {
        Self { catalog, monitor }
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    /// PoPs in use by the service instance.
    pub fn mapping(&self, instance: &ServiceInstance) -> PlacementMapping {
        PlacementMapping::from_instance(instance, &self.catalog)
    }

    fn check_capacity(
        &self,
        instance: &ServiceInstance,
        instance_name: &str,
        requirements: &ResourceRequirements,
        pop_name: &str,
    ) -> Result<(), PlacementError> {
        let available = self.available_resources(Some(instance), pop_name)?;
        if fits(requirements, &available) {
            Ok(())
        } else {
            log::warn!(
                "Not enough resources on {} for {}: requested cpu {} memory {} storage {}, available {}",
                pop_name,
                instance_name,
                requirements.cpu,
                requirements.memory,
                requirements.storage,
                available
            );
            Err(PlacementError::InsufficientCapacity {
                instance: instance_name.to_string(),
                cpu: requirements.cpu,
                memory: requirements.memory,
                storage: requirements.storage,
            })
        }
    }

    /// Add a new instance of a network function on a given PoP.
    ///
    /// * Return the name of the new instance.
    pub fn add_function_instance(&self, instance: &mut ServiceInstance, vnf_id: &str, pop_name: &str) -> Result<String, PlacementError> {
        log::debug!("add_function_instance {} {}", vnf_id, pop_name);
        if !self.catalog.contains(pop_name) {
            return Err(PlacementError::UnknownPop(pop_name.to_string()));
        }
        let requirements = match instance.vnfd(vnf_id) {
            Some(vnfd) => vnfd.resource_requirements(),
            None => return Err(PlacementError::UnknownVnf(vnf_id.to_string())),
        };
        self.check_capacity(instance, vnf_id, &requirements, pop_name)?;
        let name = instance.add_function_instance(vnf_id, Some(pop_name.to_string()))?;
        log::info!("New function instance {} on {}", name, pop_name);
        Ok(name)
    }

    /// Assign a function instance to another PoP.
    pub fn move_function_instance(&self, instance: &mut ServiceInstance, instance_name: &str, pop_name: &str) -> Result<(), PlacementError> {
        log::debug!("move_function_instance {} {}", instance_name, pop_name);
        let function = match instance.function(instance_name) {
            Some(function) => function,
            None => return Err(PlacementError::UnknownInstance(instance_name.to_string())),
        };
        if !self.catalog.contains(pop_name) {
            return Err(PlacementError::UnknownPop(pop_name.to_string()));
        }
        if function.pop.as_deref() == Some(pop_name) {
            log::debug!("{} already on {}", instance_name, pop_name);
            return Ok(());
        }
        let requirements = function.requirements.clone();
        self.check_capacity(instance, instance_name, &requirements, pop_name)?;
        let previous = instance.move_function_instance(instance_name, pop_name)?;
        log::info!("Function instance {} moved from {} to {}", instance_name, previous.unwrap_or_default(), pop_name);
        Ok(())
    }

    pub fn delete_function_instance(&self, instance: &mut ServiceInstance, instance_name: &str) -> Result<(), PlacementError> {
        log::debug!("delete_function_instance {}", instance_name);
        let function = instance.delete_function_instance(instance_name)?;
        log::info!("Function instance {} deleted from {}", instance_name, function.pop.unwrap_or_default());
        Ok(())
    }

    pub fn add_link(&self, instance: &mut ServiceInstance, source: &str, target: &str, via_path: Vec<String>) -> Result<(), PlacementError> {
        log::debug!("add_link {} {} {:?}", source, target, via_path);
        instance.add_link(source, target, via_path)
    }

    /// * Return true if a link has been removed.
    pub fn delete_link(&self, instance: &mut ServiceInstance, source: &str, target: &str) -> Result<bool, PlacementError> {
        log::debug!("delete_link {} {}", source, target);
        instance.delete_link(source, target)
    }

    pub fn apply(&self, instance: &mut ServiceInstance, action: &PlacementAction) -> Result<(), PlacementError> {
        match action {
            PlacementAction::AddInstance { vnf_id, pop } => self.add_function_instance(instance, vnf_id, pop).map(|_| ()),
            PlacementAction::MoveInstance { instance: name, pop } => self.move_function_instance(instance, name, pop),
            PlacementAction::DeleteInstance { instance: name } => self.delete_function_instance(instance, name),
            PlacementAction::AddLink { source, target, via_path } => self.add_link(instance, source, target, via_path.clone()),
            PlacementAction::DeleteLink { source, target } => self.delete_link(instance, source, target).map(|_| ()),
        }
    }

    /// Apply all the actions to a copy of the service instance.
    ///
    /// * Return the modified copy, or the first error, in which case nothing
    ///   has been applied.
    pub fn apply_all(&self, instance: &ServiceInstance, actions: &[PlacementAction]) -> Result<ServiceInstance, PlacementError> {
        let mut updated = instance.clone();
        for action in actions {
            if let Err(err) = self.apply(&mut updated, action) {
                log::debug!("Cannot {}: {}", action, err);
                return Err(err);
            }
        }
        Ok(updated)
    }

    pub fn available_pops(&self) -> Vec<String> {
        self.catalog.pop_names()
    }

    pub fn total_resources(&self, pop_name: &str) -> Result<SystemResource, PlacementError> {
        match self.catalog.get(pop_name) {
            Some(pop) => Ok(pop.resources.clone()),
            None => Err(PlacementError::UnknownPop(pop_name.to_string())),
        }
    }

    /// Capacity left on a PoP, considering the function instances assigned to
    /// it in the given service instance.
    pub fn available_resources(&self, instance: Option<&ServiceInstance>, pop_name: &str) -> Result<SystemResource, PlacementError> {
        match self.catalog.availability(instance).remove(pop_name) {
            Some(resources) => Ok(resources),
            None => Err(PlacementError::UnknownPop(pop_name.to_string())),
        }
    }

    pub fn total_cpu(&self, pop_name: &str) -> Result<f64, PlacementError> {
        self.total_resources(pop_name).map(|x| x.cpu)
    }

    pub fn total_memory(&self, pop_name: &str) -> Result<f64, PlacementError> {
        self.total_resources(pop_name).map(|x| x.memory)
    }

    pub fn total_storage(&self, pop_name: &str) -> Result<f64, PlacementError> {
        self.total_resources(pop_name).map(|x| x.storage)
    }

    pub fn available_cpu(&self, instance: Option<&ServiceInstance>, pop_name: &str) -> Result<f64, PlacementError> {
        self.available_resources(instance, pop_name).map(|x| x.cpu)
    }

    pub fn available_memory(&self, instance: Option<&ServiceInstance>, pop_name: &str) -> Result<f64, PlacementError> {
        self.available_resources(instance, pop_name).map(|x| x.memory)
    }

    pub fn available_storage(&self, instance: Option<&ServiceInstance>, pop_name: &str) -> Result<f64, PlacementError> {
        self.available_resources(instance, pop_name).map(|x| x.storage)
    }

    pub fn overloaded(&self, instance: &ServiceInstance) -> Vec<String> {
        self.monitor.evaluate(instance).overloaded
    }

    pub fn underloaded(&self, instance: &ServiceInstance) -> Vec<String> {
        self.monitor.evaluate(instance).underloaded
    }
}
