// SPDX-License-Identifier: MIT

//! Job records: the master-side state of one submitted workload.

use crate::desc::{update_action, JobDescription, UpdateAction, DEFAULT_VERSION};
use crate::pod::{PodId, PodInfo};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

crate::define_id! {
    /// Unique identifier for a job.
    pub struct JobId("job-");
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Submitted, no worker has fetched yet.
    Pending,
    /// At least one worker is pulling tasks.
    Running,
    /// A description update is rolling out.
    Updating,
    /// Terminated; waiting for pods to drain.
    Destroying,
    /// Drained; the record is about to be removed.
    Finished,
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Running => "running",
        Updating => "updating",
        Destroying => "destroying",
        Finished => "finished",
    }
}

/// Identity captured when a job is terminated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminator {
    pub user: String,
    pub hostname: String,
}

/// One submitted workload and everything the master tracks about it.
///
/// All fields are mutated only under the job-manager mutex; the whole record
/// serializes as the durable store value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    /// Currently advertised description.
    pub desc: JobDescription,
    /// Every description version ever applied, keyed by version string.
    pub descs: HashMap<String, JobDescription>,
    pub current_version: String,
    /// Pod action computed by the latest update.
    pub action: UpdateAction,
    #[serde(default)]
    pub pods: HashMap<PodId, PodInfo>,
    /// Pods still in a pre-serving state, capped by `desc.deploy.step`.
    #[serde(default)]
    pub deploying_pods: HashSet<PodId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminator: Option<Terminator>,
    /// Epoch µs.
    pub create_time: u64,
    /// Epoch µs of the last applied update.
    pub update_time: u64,
}

impl Job {
    /// Create a pending job from a submitted description.
    pub fn new(id: JobId, mut desc: JobDescription, now_us: u64) -> Self {
        if desc.version.is_empty() {
            desc.version = DEFAULT_VERSION.to_string();
        }
        let mut descs = HashMap::new();
        descs.insert(desc.version.clone(), desc.clone());
        Self {
            id,
            status: JobStatus::Pending,
            current_version: desc.version.clone(),
            action: UpdateAction::Null,
            desc,
            descs,
            pods: HashMap::new(),
            deploying_pods: HashSet::new(),
            terminator: None,
            create_time: now_us,
            update_time: now_us,
        }
    }

    /// Apply a new description during an update transition.
    ///
    /// Stamps `update_time`, records the version, computes the pod action
    /// from the spec diff (a null diff retains the prior action), and swaps
    /// the advertised description.
    pub fn apply_update(&mut self, mut desc: JobDescription, now_us: u64) {
        if desc.version.is_empty() {
            desc.version = DEFAULT_VERSION.to_string();
        }
        self.update_time = now_us;
        self.current_version = desc.version.clone();
        self.descs.insert(desc.version.clone(), desc.clone());
        match update_action(&self.desc.pod, &desc.pod) {
            UpdateAction::Null => {}
            changed => self.action = changed,
        }
        self.desc = desc;
    }

    /// True when every pod has caught up to the latest update.
    pub fn all_pods_current(&self) -> bool {
        self.pods.values().all(|pod| pod.update_time >= self.update_time)
    }

    /// Drop deploying-set entries whose pod no longer exists.
    ///
    /// Liveness eviction removes only the pod record; the step-gate set is
    /// reconciled here, on the next admission decision that reads it.
    pub fn prune_deploying(&mut self) {
        let pods = &self.pods;
        self.deploying_pods.retain(|id| pods.contains_key(id));
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
