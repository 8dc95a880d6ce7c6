// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

use futures::SinkExt;

use crate::service_instance::ServiceInstance;

/// Thresholds applied to all the instances of a network function.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PerformanceThreshold {
    pub vnf_id: String,
    pub cpu_upper_l: f64,
    pub cpu_lower_l: f64,
    pub mem_upper_l: f64,
    pub mem_lower_l: f64,
    /// An instance whose average CPU or memory usage is above this level
    /// is overloaded.
    pub scale_out_upper_l: f64,
    /// An instance whose average CPU and memory usage are both below this
    /// level is underloaded.
    pub scale_in_lower_l: f64,
    /// Number of most recent samples averaged. Instances with fewer samples
    /// are not classified.
    pub history_check: usize,
}

/// One resource usage sample of a function instance, in percentage.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct MonitorStats {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub cpu: f64,
    pub memory: f64,
}

impl MonitorStats {
    pub fn now(cpu: f64, memory: f64) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            cpu,
            memory,
        }
    }
}

/// Outcome of an evaluation pass. The two lists are disjoint.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct LoadReport {
    pub overloaded: Vec<String>,
    pub underloaded: Vec<String>,
}

impl LoadReport {
    pub fn is_empty(&self) -> bool {
        self.overloaded.is_empty() && self.underloaded.is_empty()
    }
}

impl std::fmt::Display for LoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "overloaded [{}] underloaded [{}]", self.overloaded.join(","), self.underloaded.join(","))
    }
}

// Inconsistencies of a threshold that do not prevent its use.
fn threshold_issues(threshold: &PerformanceThreshold, max_history: usize) -> Vec<String> {
    let mut issues = vec![];
    if threshold.cpu_lower_l > threshold.cpu_upper_l {
        issues.push("CPU lower bound above upper bound".to_string());
    }
    if threshold.mem_lower_l > threshold.mem_upper_l {
        issues.push("memory lower bound above upper bound".to_string());
    }
    if threshold.scale_in_lower_l > threshold.scale_out_upper_l {
        issues.push("scale-in level above scale-out level".to_string());
    }
    if threshold.history_check == 0 {
        issues.push("history check 0, at least one sample will be required".to_string());
    }
    if threshold.history_check > max_history {
        issues.push(format!(
            "history check {} above the {} samples kept, instances will never be classified",
            threshold.history_check, max_history
        ));
    }
    issues
}

struct MonitorState {
    // key: vnf_id
    thresholds: std::collections::BTreeMap<String, PerformanceThreshold>,
    // key: function instance name
    history: std::collections::BTreeMap<String, std::collections::VecDeque<MonitorStats>>,
    max_history: usize,
}

/// Load & threshold monitor, shared by the orchestrator, the metric
/// collectors and the periodic evaluation task.
#[derive(Clone)]
pub struct MonitorHandle {
    state: std::sync::Arc<std::sync::Mutex<MonitorState>>,
}

impl MonitorHandle {
    pub fn new(thresholds: Vec<PerformanceThreshold>, max_history: usize) -> Self {
        let handle = Self {
            state: std::sync::Arc::new(std::sync::Mutex::new(MonitorState {
                thresholds: std::collections::BTreeMap::new(),
                history: std::collections::BTreeMap::new(),
                max_history: max_history.max(1),
            })),
        };
        for threshold in thresholds {
            handle.set_threshold(threshold);
        }
        handle
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the threshold of a network function.
    #[allow(clippy::too_many_arguments)]
    pub fn update_threshold(
        &self,
        vnf_id: &str,
        cpu_upper_l: f64,
        cpu_lower_l: f64,
        mem_upper_l: f64,
        mem_lower_l: f64,
        scale_out_upper_l: f64,
        scale_in_lower_l: f64,
        history_check: usize,
    ) {
        self.set_threshold(PerformanceThreshold {
            vnf_id: vnf_id.to_string(),
            cpu_upper_l,
            cpu_lower_l,
            mem_upper_l,
            mem_lower_l,
            scale_out_upper_l,
            scale_in_lower_l,
            history_check,
        });
    }

    /// Replace the threshold of a network function, with no merge with the
    /// previous one.
    pub fn set_threshold(&self, threshold: PerformanceThreshold) {
        let mut state = self.lock();
        for issue in threshold_issues(&threshold, state.max_history) {
            log::warn!("Threshold of {}: {}", threshold.vnf_id, issue);
        }
        log::info!("Threshold of {} updated", threshold.vnf_id);
        state.thresholds.insert(threshold.vnf_id.clone(), threshold);
    }

    pub fn threshold(&self, vnf_id: &str) -> Option<PerformanceThreshold> {
        self.lock().thresholds.get(vnf_id).cloned()
    }

    pub fn thresholds(&self) -> Vec<PerformanceThreshold> {
        self.lock().thresholds.values().cloned().collect()
    }

    /// Monitor the function instances of a service instance.
    ///
    /// The history of instances already monitored is kept, that of instances
    /// no longer present is discarded.
    pub fn start_monitoring(&self, instance: &ServiceInstance) {
        let mut state = self.lock();
        state.history.retain(|name, _| instance.function(name).is_some());
        for function in instance.functions() {
            state.history.entry(function.name.clone()).or_default();
        }
        log::info!("Monitoring {} function instances of {}", state.history.len(), instance.service_name);
    }

    /// Stop monitoring and clear all the history. Thresholds are kept.
    pub fn stop_and_remove_all(&self) {
        let mut state = self.lock();
        if !state.history.is_empty() {
            log::info!("Monitoring of {} function instances stopped", state.history.len());
        }
        state.history.clear();
    }

    pub fn is_monitoring(&self, instance_name: &str) -> bool {
        self.lock().history.contains_key(instance_name)
    }

    /// Record a sample. The oldest sample is discarded when the history is
    /// full.
    ///
    /// * Return false if the instance is not monitored.
    pub fn push_sample(&self, instance_name: &str, sample: MonitorStats) -> bool {
        let mut state = self.lock();
        let max_history = state.max_history;
        match state.history.get_mut(instance_name) {
            Some(history) => {
                history.push_back(sample);
                while history.len() > max_history {
                    history.pop_front();
                }
                true
            }
            None => {
                log::debug!("Sample for {} dropped: not monitored", instance_name);
                false
            }
        }
    }

    pub fn history(&self, instance_name: &str) -> Vec<MonitorStats> {
        self.lock().history.get(instance_name).map(|x| x.iter().cloned().collect()).unwrap_or_default()
    }

    pub fn histories(&self) -> std::collections::BTreeMap<String, Vec<MonitorStats>> {
        self.lock().history.iter().map(|(name, x)| (name.clone(), x.iter().cloned().collect())).collect()
    }

    /// Classify the function instances of the given service instance.
    pub fn evaluate(&self, instance: &ServiceInstance) -> LoadReport {
        let state = self.lock();
        let mut report = LoadReport::default();
        for function in instance.functions() {
            let threshold = match state.thresholds.get(&function.vnf_id) {
                Some(threshold) => threshold,
                None => continue,
            };
            let history = match state.history.get(&function.name) {
                Some(history) => history,
                None => continue,
            };
            let needed = threshold.history_check.max(1);
            if history.len() < needed {
                log::debug!("{}: {} samples out of {}, not classified", function.name, history.len(), needed);
                continue;
            }
            let cpu_avg = history.iter().rev().take(needed).map(|x| x.cpu).sum::<f64>() / needed as f64;
            let mem_avg = history.iter().rev().take(needed).map(|x| x.memory).sum::<f64>() / needed as f64;

            if cpu_avg > threshold.scale_out_upper_l || mem_avg > threshold.scale_out_upper_l {
                log::debug!("{} overloaded: cpu {:.1} memory {:.1}", function.name, cpu_avg, mem_avg);
                report.overloaded.push(function.name.clone());
            } else if cpu_avg < threshold.scale_in_lower_l && mem_avg < threshold.scale_in_lower_l {
                log::debug!("{} underloaded: cpu {:.1} memory {:.1}", function.name, cpu_avg, mem_avg);
                report.underloaded.push(function.name.clone());
            }
        }
        report
    }

    /// Periodically evaluate the active service instance, if any, and
    /// publish the non-empty reports. The task ends when the receiver of the
    /// reports is dropped.
    pub fn evaluation_task(
        &self,
        deployment: crate::active_deployment::DeploymentHandle,
        interval_secs: u64,
        reports: futures::channel::mpsc::UnboundedSender<LoadReport>,
    ) -> std::pin::Pin<Box<dyn futures::Future<Output = ()> + Send>> {
        let monitor = self.clone();
        let mut reports = reports;
        Box::pin(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(interval_secs.max(1)));
            loop {
                interval.tick().await;
                let active = match deployment.snapshot().active.clone() {
                    Some(active) => active,
                    None => continue,
                };
                let report = monitor.evaluate(&active.instance);
                if report.is_empty() {
                    continue;
                }
                log::info!("Load report for {}: {}", active.instance.service_name, report);
                if reports.send(report).await.is_err() {
                    log::info!("Load report receiver gone, monitor task stopped");
                    break;
                }
            }
        })
    }
}
