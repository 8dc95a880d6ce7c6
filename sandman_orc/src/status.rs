// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

use crate::active_deployment::{DeploymentHandle, DeploymentState};
use crate::monitor::{MonitorHandle, MonitorStats, PerformanceThreshold};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FunctionStatus {
    pub vnf_id: String,
    pub vnf_name: String,
    pub pop: Option<String>,
}

/// Read-only view of the orchestrator, for status endpoints and dashboards.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StatusReport {
    /// Either `DEPLOYED` or `UNDEPLOYED`.
    pub status: String,
    pub state: DeploymentState,
    pub service: Option<String>,
    pub deployed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub service_graph: Option<crate::graph::Graph>,
    pub topology_graph: Option<crate::graph::Graph>,
    // key: function instance name
    pub functions: std::collections::BTreeMap<String, FunctionStatus>,
    // key: PoP name, value: deployment name
    pub stacks: std::collections::BTreeMap<String, String>,
    pub thresholds: Vec<PerformanceThreshold>,
    // key: function instance name, most recent sample last
    pub history: std::collections::BTreeMap<String, Vec<MonitorStats>>,
}

impl StatusReport {
    /// Build the report from a single snapshot of the orchestrator state.
    ///
    /// At most `history_len` samples are reported per function instance.
    pub fn new(
        deployment: &DeploymentHandle,
        monitor: &MonitorHandle,
        catalog: &crate::catalog::ResourceCatalog,
        history_len: usize,
    ) -> Self {
        let snapshot = deployment.snapshot();
        let instance = snapshot.active.as_ref().map(|x| &x.instance);

        let functions = instance
            .map(|instance| {
                instance
                    .functions()
                    .into_iter()
                    .map(|x| {
                        (
                            x.name.clone(),
                            FunctionStatus {
                                vnf_id: x.vnf_id.clone(),
                                vnf_name: x.descriptor.name.clone(),
                                pop: x.pop.clone(),
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        let history = monitor
            .histories()
            .into_iter()
            .map(|(name, samples)| {
                let skip = samples.len().saturating_sub(history_len);
                (name, samples.into_iter().skip(skip).collect())
            })
            .collect();

        Self {
            status: if snapshot.is_deployed() { "DEPLOYED" } else { "UNDEPLOYED" }.to_string(),
            state: snapshot.state,
            service: instance.map(|x| x.service_name.clone()),
            deployed_at: snapshot.active.as_ref().map(|x| x.deployed_at),
            service_graph: crate::graph::service_graph(instance),
            topology_graph: crate::graph::topology_graph(catalog),
            functions,
            stacks: snapshot.stacks.clone(),
            thresholds: monitor.thresholds(),
            history,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Periodically write the status report to a file.
pub fn status_writer_task(
    path: String,
    interval_secs: u64,
    deployment: DeploymentHandle,
    monitor: MonitorHandle,
    catalog: crate::catalog::ResourceCatalog,
    history_len: usize,
) -> std::pin::Pin<Box<dyn futures::Future<Output = ()> + Send>> {
    Box::pin(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(interval_secs.max(1)));
        loop {
            interval.tick().await;
            let report = StatusReport::new(&deployment, &monitor, &catalog, history_len);
            let res = report.to_json().and_then(|json| std::fs::write(&path, json).map_err(anyhow::Error::from));
            if let Err(err) = res {
                log::warn!("Could not write the status to {}: {}", path, err);
            }
        }
    })
}
