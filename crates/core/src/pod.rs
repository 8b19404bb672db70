// SPDX-License-Identifier: MIT

//! Pod records and the action codes handed to workers.

use crate::job::JobId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a pod replica.
    ///
    /// Workers mint their own pod IDs and carry them on every fetch; the
    /// master also generates them when it needs a fresh one.
    pub struct PodId("pod-");
}

/// Lifecycle status a worker reports for its pod.
///
/// Declaration order is progression order, so `>=` comparisons express
/// "at least this far along" (e.g. `status >= Serving` means the pod has
/// finished deploying).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PodStatus {
    Pending,
    Deploying,
    Starting,
    Ready,
    Serving,
    Running,
    Stopping,
    Finished,
    Failed,
    Terminated,
}

impl PodStatus {
    /// Pod has reached a serving state and no longer counts against the
    /// deploy step gate.
    pub fn deploy_complete(&self) -> bool {
        *self >= PodStatus::Serving
    }

    /// Pod is in a pre-serving rollout phase.
    pub fn is_deploying(&self) -> bool {
        matches!(self, PodStatus::Deploying | PodStatus::Starting | PodStatus::Ready)
    }

    /// Pod is dead or on its way out.
    pub fn is_death(&self) -> bool {
        matches!(
            self,
            PodStatus::Stopping | PodStatus::Finished | PodStatus::Failed | PodStatus::Terminated
        )
    }
}

crate::simple_display! {
    PodStatus {
        Pending => "pending",
        Deploying => "deploying",
        Starting => "starting",
        Ready => "ready",
        Serving => "serving",
        Running => "running",
        Stopping => "stopping",
        Finished => "finished",
        Failed => "failed",
        Terminated => "terminated",
    }
}

/// Action code returned to a worker in a fetch response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchAction {
    /// Keep going.
    Ok,
    /// Swap data packages in place.
    Reload,
    /// Destroy the container and re-create it from the image.
    Rebuild,
    /// Back off and retry later.
    Deny,
    /// Exit now.
    Terminate,
}

crate::simple_display! {
    FetchAction {
        Ok => "ok",
        Reload => "reload",
        Rebuild => "rebuild",
        Deny => "deny",
        Terminate => "terminate",
    }
}

/// Master-side record of one pod replica.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodInfo {
    pub pod_id: PodId,
    pub job_id: JobId,
    pub endpoint: String,
    pub version: String,
    pub status: PodStatus,
    /// Epoch µs the worker process started.
    pub start_time: u64,
    /// Job update_time this pod has caught up to.
    pub update_time: u64,
    /// Epoch µs of the last fetch from this pod.
    pub heartbeat_time: u64,
}

#[cfg(test)]
#[path = "pod_tests.rs"]
mod tests;
