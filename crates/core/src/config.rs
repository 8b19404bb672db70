// SPDX-License-Identifier: MIT

//! Master configuration, passed at construction.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runtime knobs and durable-store location for the master plane.
#[derive(Debug, Clone)]
pub struct MasterConfig {
    /// Period of the per-job aging checker.
    pub job_check_interval: Duration,
    /// Period of the per-pod liveness checker.
    pub pod_check_interval: Duration,
    /// Missing-heartbeat window after which a pod is evicted.
    pub pod_dead_time: Duration,
    /// Timeout applied to each outbound resource-manager request.
    pub resman_timeout: Duration,
    /// Tick period of the scheduler placement loop.
    pub sched_interval: Duration,
    /// Durable store endpoint.
    pub nexus_addr: String,
    /// Key prefix shared by all master records.
    pub nexus_root: String,
    /// Key path under the root where job records live.
    pub jobs_store_path: String,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            job_check_interval: Duration::from_secs(30),
            pod_check_interval: Duration::from_secs(10),
            pod_dead_time: Duration::from_secs(300),
            resman_timeout: Duration::from_secs(5),
            sched_interval: Duration::from_millis(500),
            nexus_addr: "127.0.0.1:8868".to_string(),
            nexus_root: "/overseer".to_string(),
            jobs_store_path: "/jobs".to_string(),
        }
    }
}

/// On-disk form: intervals in milliseconds, dead time and RPC timeout in
/// seconds. Absent keys keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    job_check_interval: Option<u64>,
    pod_check_interval: Option<u64>,
    pod_dead_time: Option<u64>,
    resman_timeout: Option<u64>,
    sched_interval: Option<u64>,
    nexus_addr: Option<String>,
    nexus_root: Option<String>,
    jobs_store_path: Option<String>,
}

impl MasterConfig {
    pub fn from_toml(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let raw: RawConfig = toml::from_str(&text)?;
        let mut config = Self::default();
        if let Some(ms) = raw.job_check_interval {
            config.job_check_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = raw.pod_check_interval {
            config.pod_check_interval = Duration::from_millis(ms);
        }
        if let Some(s) = raw.pod_dead_time {
            config.pod_dead_time = Duration::from_secs(s);
        }
        if let Some(s) = raw.resman_timeout {
            config.resman_timeout = Duration::from_secs(s);
        }
        if let Some(ms) = raw.sched_interval {
            config.sched_interval = Duration::from_millis(ms);
        }
        if let Some(addr) = raw.nexus_addr {
            config.nexus_addr = addr;
        }
        if let Some(root) = raw.nexus_root {
            config.nexus_root = root;
        }
        if let Some(path) = raw.jobs_store_path {
            config.jobs_store_path = path;
        }
        Ok(config)
    }

    /// Key prefix under which every job record is stored.
    pub fn jobs_prefix(&self) -> String {
        format!("{}{}", self.nexus_root, self.jobs_store_path)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
