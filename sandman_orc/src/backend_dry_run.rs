// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

use sandman_api::infrastructure::StackSummary;
use sandman_api::pop_resource::PopResource;

/// An infrastructure backend that does not deploy anything: the stacks are
/// only recorded in memory and the templates logged.
#[derive(Clone, Default)]
pub struct DryRunBackend {
    // key: PoP name
    stacks: std::sync::Arc<std::sync::Mutex<std::collections::HashMap<String, Vec<StackSummary>>>>,
}

impl DryRunBackend {
    fn stacks(&self) -> std::sync::MutexGuard<'_, std::collections::HashMap<String, Vec<StackSummary>>> {
        self.stacks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait::async_trait]
impl sandman_api::infrastructure::InfrastructureAPI for DryRunBackend {
    async fn submit(&mut self, pop: &PopResource, deployment_name: &str, template: &str, timeout_mins: u64) -> anyhow::Result<()> {
        let mut stacks = self.stacks();
        let pop_stacks = stacks.entry(pop.pop_name.clone()).or_default();
        if pop_stacks.iter().any(|x| x.name == deployment_name) {
            anyhow::bail!("deployment {} already exists on {}", deployment_name, pop.pop_name);
        }
        let id = uuid::Uuid::new_v4().to_string();
        log::info!(
            "[dry-run] stack {} ({}) created on {} at {}, timeout {} min",
            deployment_name,
            id,
            pop.pop_name,
            pop.endpoint,
            timeout_mins
        );
        log::debug!("[dry-run] template:\n{}", template);
        pop_stacks.push(StackSummary {
            name: deployment_name.to_string(),
            id,
        });
        Ok(())
    }

    async fn list_deployments(&mut self, pop: &PopResource) -> anyhow::Result<Vec<StackSummary>> {
        Ok(self.stacks().get(&pop.pop_name).cloned().unwrap_or_default())
    }

    async fn withdraw(&mut self, pop: &PopResource, stack: &StackSummary) -> anyhow::Result<()> {
        let mut stacks = self.stacks();
        let pop_stacks = stacks.entry(pop.pop_name.clone()).or_default();
        let before = pop_stacks.len();
        pop_stacks.retain(|x| x.id != stack.id);
        if pop_stacks.len() == before {
            anyhow::bail!("no stack {} ({}) on {}", stack.name, stack.id, pop.pop_name);
        }
        log::info!("[dry-run] stack {} ({}) deleted from {}", stack.name, stack.id, pop.pop_name);
        Ok(())
    }
}
