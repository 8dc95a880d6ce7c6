// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

pub mod active_deployment;
pub mod backend_dry_run;
pub mod catalog;
pub mod error;
pub mod graph;
pub mod monitor;
pub mod orchestrator;
mod orchestrator_task;
pub mod placement_logic;
pub mod placement_manager;
pub mod service_instance;
pub mod status;
#[cfg(test)]
mod test_utils;
pub mod translator;

use futures::StreamExt;

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum PlacementStrategy {
    /// Each function instance goes to the PoP with the most CPU available
    /// among those that can host it. It is the default strategy.
    #[default]
    GreedyBestFit,
    /// Each function instance goes to the first PoP, in name order, that can
    /// host it.
    FirstFit,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum BackendType {
    /// Record the stacks in memory and log the templates.
    #[default]
    DryRun,
}

fn default_deployment_timeout_mins() -> u64 {
    5
}

fn default_max_history() -> usize {
    300
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct SandmanOrcSettings {
    #[serde(default)]
    pub placement_strategy: PlacementStrategy,
    /// Initial number of instances of a network function, 1 if absent.
    /// key: vnf_id
    #[serde(default)]
    pub replicas: std::collections::BTreeMap<String, u32>,
    #[serde(default = "default_deployment_timeout_mins")]
    pub deployment_timeout_mins: u64,
    /// Period of the load evaluation, 0 to disable.
    #[serde(default)]
    pub monitor_interval_secs: u64,
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    /// File where the status report is periodically written, empty to
    /// disable.
    #[serde(default)]
    pub status_file: String,
    #[serde(default)]
    pub status_interval_secs: u64,
    pub resources: Vec<sandman_api::pop_resource::PopResource>,
    #[serde(default)]
    pub topology: Vec<sandman_api::pop_resource::PopLink>,
    #[serde(default)]
    pub thresholds: Vec<monitor::PerformanceThreshold>,
    #[serde(default)]
    pub backend: BackendType,
}

pub async fn sandman_orc_main(settings: SandmanOrcSettings, deploy_path: Option<String>) {
    log::info!("Starting Sandman orchestrator with {} PoPs", settings.resources.len());
    log::debug!("Settings: {:?}", settings);

    let monitor = monitor::MonitorHandle::new(settings.thresholds.clone(), settings.max_history);
    let backend: Box<dyn sandman_api::infrastructure::InfrastructureAPI> = match settings.backend {
        BackendType::DryRun => Box::new(backend_dry_run::DryRunBackend::default()),
    };
    let (orchestrator, orchestrator_task) = orchestrator::Orchestrator::new(
        &settings,
        Box::new(sandman_api::loader::JsonFileLoader::default()),
        backend,
        monitor.clone(),
    );

    if settings.monitor_interval_secs == 0 {
        log::info!("load monitoring disabled");
    } else {
        log::info!("load monitoring enabled every {} seconds", settings.monitor_interval_secs);
        let (report_sender, mut report_receiver) = futures::channel::mpsc::unbounded();
        let _monitor_task = tokio::spawn(monitor.evaluation_task(orchestrator.deployment(), settings.monitor_interval_secs, report_sender));
        let manager = orchestrator.placement_manager();
        let deployment = orchestrator.deployment();
        let _report_task = tokio::spawn(async move {
            while let Some(report) = report_receiver.next().await {
                let snapshot = deployment.snapshot();
                let instance = snapshot.active.as_ref().map(|x| &x.instance);
                for pop_name in manager.available_pops() {
                    if let Ok(available) = manager.available_resources(instance, &pop_name) {
                        log::info!("{} available: {}", pop_name, available);
                    }
                }
                if !report.overloaded.is_empty() {
                    log::warn!("Overloaded function instances: {}", report.overloaded.join(","));
                }
                if !report.underloaded.is_empty() {
                    log::warn!("Underloaded function instances: {}", report.underloaded.join(","));
                }
            }
        });
    }

    if settings.status_file.is_empty() {
        log::info!("status file disabled");
    } else {
        log::info!("status written to {}", settings.status_file);
        let _status_task = tokio::spawn(status::status_writer_task(
            settings.status_file.clone(),
            settings.status_interval_secs,
            orchestrator.deployment(),
            monitor.clone(),
            orchestrator.placement_manager().catalog().clone(),
            settings.max_history,
        ));
    }

    let mut client = orchestrator.get_api_client();
    if let Some(path) = deploy_path {
        if let Err(err) = client.deploy(&path).await {
            log::error!("Could not deploy {}: {}", path, err);
        }
    }

    let _signal_task = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(_) => {
                log::info!("Interrupted, terminating");
                if let Err(err) = client.terminate().await {
                    log::error!("Could not terminate: {}", err);
                }
            }
            Err(err) => log::error!("Cannot listen to the interrupt signal: {}", err),
        }
    });

    orchestrator_task.await;
}

pub fn sandman_orc_default_conf() -> String {
    String::from(
        r##"placement_strategy = "GreedyBestFit"
deployment_timeout_mins = 5
monitor_interval_secs = 10
max_history = 300
status_file = ""
status_interval_secs = 5
backend = "DryRun"

[replicas]
vnf_firewall = 1

[[resources]]
pop_name = "pop1"
endpoint = "http://10.0.0.1:5000/v2.0"
user_name = "admin"
password = "admin"
tenant_name = "admin"
resources = { cpu = 10.0, memory = 32.0, storage = 500.0 }

[[resources]]
pop_name = "pop2"
endpoint = "http://10.0.0.2:5000/v2.0"
user_name = "admin"
password = "admin"
tenant_name = "admin"
resources = { cpu = 4.0, memory = 16.0, storage = 200.0 }

[[topology]]
from = "pop1"
to = "pop2"
bandwidth = 1000.0

[[thresholds]]
vnf_id = "vnf_firewall"
cpu_upper_l = 90.0
cpu_lower_l = 10.0
mem_upper_l = 90.0
mem_lower_l = 10.0
scale_out_upper_l = 80.0
scale_in_lower_l = 20.0
history_check = 3
"##,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_conf() {
        let settings: SandmanOrcSettings = toml::from_str(&sandman_orc_default_conf()).unwrap();
        assert_eq!(PlacementStrategy::GreedyBestFit, settings.placement_strategy);
        assert_eq!(2, settings.resources.len());
        assert_eq!(10.0, settings.resources[0].resources.cpu);
        assert_eq!(Some(1000.0), settings.topology[0].bandwidth);
        assert_eq!(3, settings.thresholds[0].history_check);
        assert_eq!(Some(&1), settings.replicas.get("vnf_firewall"));
    }

    #[test]
    fn test_minimal_conf() {
        let settings: SandmanOrcSettings = toml::from_str(
            r##"
[[resources]]
pop_name = "A"
endpoint = "http://a:5000/v2.0"
resources = { cpu = 10.0, memory = 64.0, storage = 1000.0 }
"##,
        )
        .unwrap();
        assert_eq!(PlacementStrategy::GreedyBestFit, settings.placement_strategy);
        assert_eq!(5, settings.deployment_timeout_mins);
        assert_eq!(300, settings.max_history);
        assert_eq!(0, settings.monitor_interval_secs);
        assert_eq!(BackendType::DryRun, settings.backend);
        assert!(settings.status_file.is_empty());
        assert!(settings.resources[0].password.is_empty());
    }
}
