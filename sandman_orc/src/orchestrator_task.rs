// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

use futures::StreamExt;
use itertools::Itertools;

use crate::active_deployment::{ActiveDeployment, DeploymentHandle, DeploymentSnapshot, DeploymentState};
use crate::error::DeploymentError;
use crate::orchestrator::OrchestratorRequest;
use crate::placement_logic::PlacementMapping;
use crate::service_instance::ServiceInstance;
use crate::translator::DeploymentTemplate;
use sandman_api::pop_resource::PopResource;

pub(crate) struct OrchestratorTask {
    receiver: futures::channel::mpsc::UnboundedReceiver<OrchestratorRequest>,
    loader: Box<dyn sandman_api::loader::DescriptorLoaderAPI>,
    backend: Box<dyn sandman_api::infrastructure::InfrastructureAPI>,
    plugin: Box<dyn crate::placement_logic::PlacementPlugin>,
    translator: Box<dyn crate::translator::TemplateTranslator>,
    manager: crate::placement_manager::PlacementManager,
    monitor: crate::monitor::MonitorHandle,
    deployment: DeploymentHandle,
    deployment_timeout_mins: u64,
}

fn reply(reply_channel: Option<tokio::sync::oneshot::Sender<bool>>, res: bool, what: &str) {
    if let Some(reply_channel) = reply_channel {
        if reply_channel.send(res).is_err() {
            log::warn!("Orchestrator channel error in {}: reply dropped", what);
        }
    }
}

fn deployment_name(service_name: &str) -> String {
    format!("{}-{}", chrono::Utc::now().format("%y%m%d%H%M%S"), service_name)
}

impl OrchestratorTask {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        receiver: futures::channel::mpsc::UnboundedReceiver<OrchestratorRequest>,
        loader: Box<dyn sandman_api::loader::DescriptorLoaderAPI>,
        backend: Box<dyn sandman_api::infrastructure::InfrastructureAPI>,
        plugin: Box<dyn crate::placement_logic::PlacementPlugin>,
        translator: Box<dyn crate::translator::TemplateTranslator>,
        manager: crate::placement_manager::PlacementManager,
        monitor: crate::monitor::MonitorHandle,
        deployment: DeploymentHandle,
        deployment_timeout_mins: u64,
    ) -> Self {
        Self {
            receiver,
            loader,
            backend,
            plugin,
            translator,
            manager,
            monitor,
            deployment,
            deployment_timeout_mins,
        }
    }

    // Main orchestration loop.
    pub async fn run(&mut self) {
        while let Some(req) = self.receiver.next().await {
            match req {
                OrchestratorRequest::Deploy(path, reply_channel) => {
                    log::debug!("Orchestrator Deploy {}", path);
                    let res = self.deploy(&path).await;
                    reply(reply_channel, res, "DEPLOY");
                }
                OrchestratorRequest::Undeploy(reply_channel) => {
                    log::debug!("Orchestrator Undeploy");
                    let res = self.teardown().await;
                    reply(reply_channel, res, "UNDEPLOY");
                }
                OrchestratorRequest::Update(actions, reply_channel) => {
                    log::debug!("Orchestrator Update [{}]", actions.iter().join(", "));
                    let res = self.update(&actions).await;
                    reply(reply_channel, res, "UPDATE");
                }
                OrchestratorRequest::Terminate(reply_channel) => {
                    log::debug!("Orchestrator Terminate");
                    let res = self.teardown().await;
                    reply(reply_channel, res, "TERMINATE");
                    break;
                }
            }
        }
        log::info!("Orchestrator terminated");
    }

    /// Scale and place a new service, then translate it.
    fn prepare(&self, path: &str) -> Result<(ServiceInstance, PlacementMapping, Vec<DeploymentTemplate>), DeploymentError> {
        let data = self.loader.parse_service_description(path)?;
        let mut instance = self.plugin.initial_scaling(&data)?;
        let mapping = self.plugin.initial_placement(&mut instance, self.manager.catalog())?;
        let templates = self.translate(&instance, &mapping)?;
        Ok((instance, mapping, templates))
    }

    /// Return one template per PoP of the mapping, in mapping order.
    fn translate(&self, instance: &ServiceInstance, mapping: &PlacementMapping) -> Result<Vec<DeploymentTemplate>, DeploymentError> {
        let templates = self
            .translator
            .translate(instance, self.manager.catalog(), mapping)
            .map_err(|err| DeploymentError::Translation(err.to_string()))?;
        let pop_names = mapping.pop_names();
        if templates.len() != pop_names.len() {
            return Err(DeploymentError::Translation(format!(
                "{} templates for {} PoPs",
                templates.len(),
                pop_names.len()
            )));
        }
        if let Some((template, pop_name)) = templates.iter().zip(pop_names.iter()).find(|(t, p)| &t.pop_name != *p) {
            return Err(DeploymentError::Translation(format!(
                "template for {} found where {} was expected",
                template.pop_name, pop_name
            )));
        }
        Ok(templates)
    }

    /// Submit a template to a PoP.
    ///
    /// * Return true if the submission succeeded.
    async fn submit(&mut self, pop: &PopResource, deployment_name: &str, template: &DeploymentTemplate) -> bool {
        let body = match template.to_json() {
            Ok(body) => body,
            Err(err) => {
                log::error!("Submission of {} to {} failed: {}", deployment_name, pop.pop_name, err);
                return false;
            }
        };
        match self.backend.submit(pop, deployment_name, &body, self.deployment_timeout_mins).await {
            Ok(_) => {
                log::info!("Deployment {} submitted to {}", deployment_name, pop.pop_name);
                true
            }
            Err(err) => {
                log::error!("Submission of {} to {} failed: {}", deployment_name, pop.pop_name, err);
                false
            }
        }
    }

    /// Withdraw all the stacks with a given name from a PoP.
    ///
    /// * Return true if no withdrawal failed.
    async fn withdraw(&mut self, pop: &PopResource, deployment_name: &str) -> bool {
        let stacks = match self.backend.list_deployments(pop).await {
            Ok(stacks) => stacks,
            Err(err) => {
                log::error!("Withdrawal of {} from {} failed: cannot list deployments: {}", deployment_name, pop.pop_name, err);
                return false;
            }
        };
        let mut all_ok = true;
        let mut found = false;
        for stack in stacks.iter().filter(|x| x.name == deployment_name) {
            found = true;
            match self.backend.withdraw(pop, stack).await {
                Ok(_) => log::info!("Deployment {} ({}) withdrawn from {}", stack.name, stack.id, pop.pop_name),
                Err(err) => {
                    log::error!("Withdrawal of {} ({}) from {} failed: {}", stack.name, stack.id, pop.pop_name, err);
                    all_ok = false;
                }
            }
        }
        if !found {
            log::warn!("Deployment {} not found on {}: nothing to withdraw", deployment_name, pop.pop_name);
        }
        all_ok
    }

    /// Deploy a new service, replacing the current one if any.
    ///
    /// * Return true if all the templates have been submitted.
    async fn deploy(&mut self, path: &str) -> bool {
        let prior = self.deployment.state();
        if prior != DeploymentState::Idle && prior != DeploymentState::Deployed {
            log::error!("Deploy of {} rejected: {}", path, DeploymentError::Busy(prior));
            return false;
        }

        if prior == DeploymentState::Idle {
            self.deployment.set_state(DeploymentState::Deploying);
        }
        let (instance, mapping, templates) = match self.prepare(path) {
            Ok(prepared) => prepared,
            Err(err) => {
                log::error!("Deploy of {} aborted: {}", path, err);
                self.deployment.set_state(prior);
                return false;
            }
        };

        if prior == DeploymentState::Deployed {
            log::info!("Replacing the current deployment with {}", instance.service_name);
            self.teardown().await;
            self.deployment.set_state(DeploymentState::Deploying);
        }

        let name = deployment_name(&instance.service_name);
        let mut stacks = std::collections::BTreeMap::new();
        let mut all_ok = true;
        for template in &templates {
            let pop = match mapping.get(&template.pop_name) {
                Some(pop) => pop.clone(),
                None => continue,
            };
            if self.submit(&pop, &name, template).await {
                stacks.insert(pop.pop_name.clone(), name.clone());
            } else {
                all_ok = false;
            }
        }
        if !all_ok {
            log::warn!("Service {} partially deployed: {} PoPs out of {}", instance.service_name, stacks.len(), templates.len());
        }

        self.monitor.start_monitoring(&instance);
        log::info!("Service {} deployed as {} on {}", instance.service_name, name, mapping.pop_names().join(","));
        self.deployment.swap(DeploymentSnapshot {
            state: DeploymentState::Deployed,
            active: Some(std::sync::Arc::new(ActiveDeployment {
                instance,
                mapping,
                deployed_at: chrono::Utc::now(),
            })),
            stacks,
        });
        all_ok
    }

    /// Withdraw all the tracked deployments and clear the state, even if
    /// some withdrawals fail.
    ///
    /// * Return true if no withdrawal failed.
    async fn teardown(&mut self) -> bool {
        let snapshot = self.deployment.snapshot();
        let active = match &snapshot.active {
            Some(active) => active.clone(),
            None => {
                log::debug!("Nothing to tear down");
                self.deployment.swap(DeploymentSnapshot::default());
                return true;
            }
        };
        self.deployment.set_state(DeploymentState::TearingDown);
        self.monitor.stop_and_remove_all();

        let mut all_ok = true;
        for pop in active.mapping.pops() {
            match snapshot.stacks.get(&pop.pop_name) {
                Some(name) => all_ok &= self.withdraw(pop, name).await,
                None => log::warn!("No deployment tracked on {}: skipped", pop.pop_name),
            }
        }

        self.deployment.swap(DeploymentSnapshot::default());
        log::info!("Service {} undeployed", active.instance.service_name);
        all_ok
    }

    /// Apply placement actions to the deployed service and re-realize the
    /// PoPs whose template changed.
    ///
    /// * Return true if the actions have been applied and all the PoPs
    ///   re-realized.
    async fn update(&mut self, actions: &[crate::placement_manager::PlacementAction]) -> bool {
        let snapshot = self.deployment.snapshot();
        let active = match (&snapshot.state, &snapshot.active) {
            (DeploymentState::Deployed, Some(active)) => active.clone(),
            _ => {
                log::error!("Update rejected: {}", DeploymentError::Busy(snapshot.state));
                return false;
            }
        };

        let updated = match self.manager.apply_all(&active.instance, actions) {
            Ok(updated) => updated,
            Err(err) => {
                log::error!("Update rejected: {}", DeploymentError::from(err));
                return false;
            }
        };
        let mapping = self.manager.mapping(&updated);
        let old_templates = self.translate(&active.instance, &active.mapping);
        let new_templates = self.translate(&updated, &mapping);
        let (old_templates, new_templates) = match (old_templates, new_templates) {
            (Ok(old_templates), Ok(new_templates)) => (old_templates, new_templates),
            (Err(err), _) | (_, Err(err)) => {
                log::error!("Update rejected: {}", err);
                return false;
            }
        };

        let old_by_pop: std::collections::BTreeMap<String, &DeploymentTemplate> =
            old_templates.iter().map(|x| (x.pop_name.clone(), x)).collect();
        let new_by_pop: std::collections::BTreeMap<String, &DeploymentTemplate> =
            new_templates.iter().map(|x| (x.pop_name.clone(), x)).collect();
        let affected: Vec<String> = old_by_pop
            .keys()
            .chain(new_by_pop.keys())
            .unique()
            .filter(|pop_name| old_by_pop.get(*pop_name).map(|x| &x.body) != new_by_pop.get(*pop_name).map(|x| &x.body))
            .cloned()
            .sorted()
            .collect();
        log::info!("Update of {} affects PoPs: {}", updated.service_name, affected.join(","));

        self.deployment.set_state(DeploymentState::Deploying);
        let name = deployment_name(&updated.service_name);
        let mut stacks = snapshot.stacks.clone();
        let mut all_ok = true;
        for pop_name in &affected {
            if let (Some(old_name), Some(pop)) = (stacks.remove(pop_name), active.mapping.get(pop_name)) {
                all_ok &= self.withdraw(pop, &old_name).await;
            }
            if let (Some(template), Some(pop)) = (new_by_pop.get(pop_name), mapping.get(pop_name)) {
                let pop = pop.clone();
                if self.submit(&pop, &name, template).await {
                    stacks.insert(pop_name.clone(), name.clone());
                } else {
                    all_ok = false;
                }
            }
        }

        self.monitor.start_monitoring(&updated);
        self.deployment.swap(DeploymentSnapshot {
            state: DeploymentState::Deployed,
            active: Some(std::sync::Arc::new(ActiveDeployment {
                instance: updated,
                mapping,
                deployed_at: active.deployed_at,
            })),
            stacks,
        });
        all_ok
    }
}
