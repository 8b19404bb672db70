// SPDX-License-Identifier: MIT

//! Response shapes and job views.

use crate::status::Status;
use ov_core::{Job, JobDescription, JobId, JobStatus, PodInfo, PodSpec, UpdateAction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: JobId,
    pub status: Status,
}

/// Answer to a worker fetch: the action code, the pod spec to run, and the
/// job's update_time for the worker to echo back once caught up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<PodSpec>,
    #[serde(default)]
    pub update_time: u64,
}

/// One row of a job listing, with pod counts derived from pod statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOverview {
    pub job_id: JobId,
    pub name: String,
    pub status: JobStatus,
    pub running: u32,
    pub deploying: u32,
    pub death: u32,
    pub pending: u32,
    pub create_time: u64,
    pub update_time: u64,
}

impl From<&Job> for JobOverview {
    fn from(job: &Job) -> Self {
        let mut running = 0u32;
        let mut deploying = 0u32;
        let mut death = 0u32;
        for pod in job.pods.values() {
            if pod.status == ov_core::PodStatus::Running {
                running += 1;
            } else if pod.status.is_deploying() {
                deploying += 1;
            } else if pod.status.is_death() {
                death += 1;
            }
        }
        let pending = job
            .desc
            .deploy
            .replica
            .saturating_sub(running + deploying + death);
        JobOverview {
            job_id: job.id.clone(),
            name: job.desc.name.clone(),
            status: job.status,
            running,
            deploying,
            death,
            pending,
            create_time: job.create_time,
            update_time: job.update_time,
        }
    }
}

/// Full job view: every description version and the complete pod list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInfo {
    pub job_id: JobId,
    pub status: JobStatus,
    pub desc: JobDescription,
    pub descs: HashMap<String, JobDescription>,
    pub version: String,
    pub action: UpdateAction,
    pub create_time: u64,
    pub update_time: u64,
    pub pods: Vec<PodInfo>,
}

impl From<&Job> for JobInfo {
    fn from(job: &Job) -> Self {
        let mut pods: Vec<PodInfo> = job.pods.values().cloned().collect();
        pods.sort_by(|a, b| a.pod_id.as_str().cmp(b.pod_id.as_str()));
        JobInfo {
            job_id: job.id.clone(),
            status: job.status,
            desc: job.desc.clone(),
            descs: job.descs.clone(),
            version: job.current_version.clone(),
            action: job.action,
            create_time: job.create_time,
            update_time: job.update_time,
            pods,
        }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
