// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

use futures::{Future, SinkExt};


pub enum OrchestratorRequest {
    /// Deploy the service described at the given path.
    Deploy(String, Option<tokio::sync::oneshot::Sender<bool>>),
    Undeploy(Option<tokio::sync::oneshot::Sender<bool>>),
    /// Apply incremental placement actions to the deployed service.
    Update(
        Vec<crate::placement_manager::PlacementAction>,
        Option<tokio::sync::oneshot::Sender<bool>>,
    ),
    /// Tear down and stop processing commands.
    Terminate(Option<tokio::sync::oneshot::Sender<bool>>),
}

pub struct Orchestrator {
    sender: futures::channel::mpsc::UnboundedSender<OrchestratorRequest>,
    deployment: crate::active_deployment::DeploymentHandle,
    manager: crate::placement_manager::PlacementManager,
}

/// Enqueue commands to the orchestrator.
///
/// The plain methods return as soon as the command is queued, the
/// `*_and_wait` ones when it has been processed, with its outcome.
#[derive(Clone)]
pub struct OrchestratorClient {
    sender: futures::channel::mpsc::UnboundedSender<OrchestratorRequest>,
}

impl Orchestrator {
    pub fn new(
        settings: &crate::SandmanOrcSettings,
        loader: Box<dyn sandman_api::loader::DescriptorLoaderAPI>,
        backend: Box<dyn sandman_api::infrastructure::InfrastructureAPI>,
        monitor: crate::monitor::MonitorHandle,
    ) -> (Self, std::pin::Pin<Box<dyn Future<Output = ()> + Send>>) {
        let (sender, receiver) = futures::channel::mpsc::unbounded();
        let deployment = crate::active_deployment::DeploymentHandle::default();
        let catalog = crate::catalog::ResourceCatalog::new(settings.resources.clone(), settings.topology.clone());
        let manager = crate::placement_manager::PlacementManager::new(catalog, monitor.clone());

        let mut task = crate::orchestrator_task::OrchestratorTask::new(
            receiver,
            loader,
            backend,
            Box::new(crate::placement_logic::PlacementLogic::new(
                settings.placement_strategy.clone(),
                settings.replicas.clone(),
            )),
            Box::new(crate::translator::HeatTranslator::default()),
            manager.clone(),
            monitor,
            deployment.clone(),
            settings.deployment_timeout_mins,
        );
        let main_task = Box::pin(async move {
            task.run().await;
        });

        (
            Orchestrator {
                sender,
                deployment,
                manager,
            },
            main_task,
        )
    }

    pub fn get_api_client(&self) -> OrchestratorClient {
        OrchestratorClient { sender: self.sender.clone() }
    }

    /// Read-only access to the state of the orchestrator.
    pub fn deployment(&self) -> crate::active_deployment::DeploymentHandle {
        self.deployment.clone()
    }

    /// Resource and load queries.
    pub fn placement_manager(&self) -> crate::placement_manager::PlacementManager {
        self.manager.clone()
    }
}

impl OrchestratorClient {
    async fn send(&mut self, request: OrchestratorRequest, what: &str) -> anyhow::Result<()> {
        match self.sender.send(request).await {
            Ok(_) => Ok(()),
            Err(err) => Err(anyhow::anyhow!("Orchestrator channel error when sending {}: {}", what, err)),
        }
    }

    async fn send_and_wait(
        &mut self,
        request: impl FnOnce(Option<tokio::sync::oneshot::Sender<bool>>) -> OrchestratorRequest,
        what: &str,
    ) -> anyhow::Result<bool> {
        let (reply_sender, reply_receiver) = tokio::sync::oneshot::channel::<bool>();
        self.send(request(Some(reply_sender)), what).await?;
        match reply_receiver.await {
            Ok(res) => Ok(res),
            Err(err) => Err(anyhow::anyhow!("Orchestrator channel error when waiting for {}: {}", what, err)),
        }
    }

    pub async fn deploy(&mut self, path: &str) -> anyhow::Result<()> {
        self.send(OrchestratorRequest::Deploy(path.to_string(), None), "deploy").await
    }

    pub async fn deploy_and_wait(&mut self, path: &str) -> anyhow::Result<bool> {
        let path = path.to_string();
        self.send_and_wait(|reply| OrchestratorRequest::Deploy(path, reply), "deploy").await
    }

    pub async fn undeploy(&mut self) -> anyhow::Result<()> {
        self.send(OrchestratorRequest::Undeploy(None), "undeploy").await
    }

    pub async fn undeploy_and_wait(&mut self) -> anyhow::Result<bool> {
        self.send_and_wait(OrchestratorRequest::Undeploy, "undeploy").await
    }

    pub async fn update(&mut self, actions: Vec<crate::placement_manager::PlacementAction>) -> anyhow::Result<()> {
        self.send(OrchestratorRequest::Update(actions, None), "update").await
    }

    pub async fn update_and_wait(&mut self, actions: Vec<crate::placement_manager::PlacementAction>) -> anyhow::Result<bool> {
        self.send_and_wait(|reply| OrchestratorRequest::Update(actions, reply), "update").await
    }

    pub async fn terminate(&mut self) -> anyhow::Result<()> {
        self.send(OrchestratorRequest::Terminate(None), "terminate").await
    }

    pub async fn terminate_and_wait(&mut self) -> anyhow::Result<bool> {
        self.send_and_wait(OrchestratorRequest::Terminate, "terminate").await
    }
}
