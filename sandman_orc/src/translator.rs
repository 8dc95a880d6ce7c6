// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

use crate::catalog::ResourceCatalog;
use crate::placement_logic::PlacementMapping;
use crate::service_instance::ServiceInstance;

/// Deployment template for a single PoP.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentTemplate {
    pub pop_name: String,
    pub body: serde_json::Value,
}

impl DeploymentTemplate {
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(&self.body)?)
    }
}

/// Translate a placed service instance into deployment templates.
pub trait TemplateTranslator: Send + Sync {
    /// Return one template per PoP of the mapping, in the same order as
    /// `PlacementMapping::pop_names`.
    fn translate(
        &self,
        instance: &ServiceInstance,
        catalog: &ResourceCatalog,
        mapping: &PlacementMapping,
    ) -> anyhow::Result<Vec<DeploymentTemplate>>;
}

pub const HEAT_TEMPLATE_VERSION: &str = "2015-04-30";

/// Produce OpenStack Heat templates, in JSON.
#[derive(Clone, Default)]
pub struct HeatTranslator {}

impl HeatTranslator {
    fn translate_pop(&self, instance: &ServiceInstance, pop_name: &str) -> anyhow::Result<serde_json::Value> {
        let mut resources = serde_json::Map::new();

        // One network per link group with at least one endpoint on this PoP,
        // one port per endpoint on this PoP.
        // key: function instance name
        let mut ports: std::collections::BTreeMap<String, std::collections::BTreeSet<String>> = std::collections::BTreeMap::new();
        for links in instance.inner_links().values().chain(instance.outer_links().values()) {
            for link in links.values() {
                let local: Vec<_> = link
                    .interfaces
                    .iter()
                    .filter(|x| instance.function(&x.instance).is_some_and(|f| f.pop.as_deref() == Some(pop_name)))
                    .collect();
                if local.is_empty() {
                    continue;
                }
                let network = format!("net-{}", link.id);
                resources.insert(
                    network.clone(),
                    serde_json::json!({
                        "type": "OS::Neutron::Net",
                        "properties": { "name": format!("{}-{}", instance.service_name, link.id) }
                    }),
                );
                for interface in local {
                    let port = format!("{}-{}-{}", interface.instance, interface.port, link.id);
                    resources.insert(
                        port.clone(),
                        serde_json::json!({
                            "type": "OS::Neutron::Port",
                            "properties": { "network": { "get_resource": network } }
                        }),
                    );
                    ports.entry(interface.instance.clone()).or_default().insert(port);
                }
            }
        }

        for function in instance.instances_on(pop_name) {
            if function.descriptor.virtual_deployment_units.is_empty() {
                anyhow::bail!("function instance {} has no virtual deployment units", function.name);
            }
            for (i, vdu) in function.descriptor.virtual_deployment_units.iter().enumerate() {
                // Ports are attached to the first VDU.
                let networks: Vec<serde_json::Value> = match (i, ports.get(&function.name)) {
                    (0, Some(ports)) => ports.iter().map(|x| serde_json::json!({ "port": { "get_resource": x } })).collect(),
                    _ => vec![],
                };
                let requirements = &vdu.resource_requirements;
                resources.insert(
                    format!("{}-{}", function.name, vdu.id),
                    serde_json::json!({
                        "type": "OS::Nova::Server",
                        "properties": {
                            "name": format!("{}-{}-{}", instance.service_name, function.name, vdu.id),
                            "image": vdu.vm_image,
                            "flavor": format!("sandman.c{}.m{}.d{}", requirements.cpu, requirements.memory, requirements.storage),
                            "networks": networks,
                        }
                    }),
                );
            }
        }

        Ok(serde_json::json!({
            "heat_template_version": HEAT_TEMPLATE_VERSION,
            "description": format!("{} on {}", instance.service_name, pop_name),
            "resources": resources,
        }))
    }
}

impl TemplateTranslator for HeatTranslator {
    fn translate(
        &self,
        instance: &ServiceInstance,
        catalog: &ResourceCatalog,
        mapping: &PlacementMapping,
    ) -> anyhow::Result<Vec<DeploymentTemplate>> {
        let mut templates = vec![];
        for pop_name in mapping.pop_names() {
            if !catalog.contains(&pop_name) {
                anyhow::bail!("PoP {} not in the resource catalog", pop_name);
            }
            templates.push(DeploymentTemplate {
                body: self.translate_pop(instance, &pop_name)?,
                pop_name,
            });
        }
        log::debug!("Translated {} into {} templates", instance.service_name, templates.len());
        Ok(templates)
    }
}
