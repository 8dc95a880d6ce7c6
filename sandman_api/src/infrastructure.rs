// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

/// A deployment (stack) as listed by the infrastructure backend of a PoP.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct StackSummary {
    pub name: String,
    pub id: String,
}

/// Infrastructure backend that realizes deployment templates in a PoP.
///
/// The endpoint and credentials of the PoP are those found in the
/// `PopResource`.
#[async_trait::async_trait]
pub trait InfrastructureAPI: Sync + Send {
    /// Create a new deployment with a given name from a template.
    async fn submit(
        &mut self,
        pop: &crate::pop_resource::PopResource,
        deployment_name: &str,
        template: &str,
        timeout_mins: u64,
    ) -> anyhow::Result<()>;

    /// List all the deployments currently known by the PoP.
    async fn list_deployments(&mut self, pop: &crate::pop_resource::PopResource) -> anyhow::Result<Vec<StackSummary>>;

    /// Remove a deployment, previously resolved via `list_deployments`.
    async fn withdraw(&mut self, pop: &crate::pop_resource::PopResource, stack: &StackSummary) -> anyhow::Result<()>;
}
