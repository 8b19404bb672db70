// SPDX-License-Identifier: MIT

//! Client- and worker-originated request shapes.

use ov_core::{JobDescription, JobId, PodId, PodStatus};
use serde::{Deserialize, Serialize};

/// Create a new pending job from a description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub desc: JobDescription,
}

/// Swap in a new description for an existing job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub job_id: JobId,
    pub desc: JobDescription,
}

/// Terminate a job, capturing who asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminateRequest {
    pub job_id: JobId,
    pub user: String,
    pub hostname: String,
}

/// The periodic pull from a worker: heartbeat plus current pod status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub job_id: JobId,
    pub pod_id: PodId,
    pub endpoint: String,
    pub status: PodStatus,
    /// Epoch µs the worker process started.
    pub start_time: u64,
    /// Job update_time the worker has caught up to.
    pub update_time: u64,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
