// SPDX-License-Identifier: MIT

//! Per-pod liveness: evict pods whose heartbeats stop.
//!
//! Each checker holds a (job id, pod id) pair and re-looks both up under
//! the mutex; a vanished job or pod ends the checker. Dead-pod removal here
//! and finished-job clearing in the aging check are the only two places
//! records are destroyed.

use super::JobManager;
use ov_core::{Clock, JobId, PodId};
use ov_store::MetaStore;

impl<S: MetaStore, C: Clock> JobManager<S, C> {
    /// Arm the liveness checker for one pod.
    pub(crate) fn spawn_pod_checker(&self, job_id: JobId, pod_id: PodId) {
        let manager = self.clone();
        let shutdown = self.inner.shutdown.clone();
        tokio::spawn(async move {
            let interval = manager.inner.config.pod_check_interval;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                if !manager.check_pod_alive(&job_id, &pod_id) {
                    break;
                }
            }
        });
    }

    /// One liveness tick. Returns false when the checker should stop.
    ///
    /// The deploying-pod set is reconciled lazily by the next admission
    /// decision, not here.
    pub(crate) fn check_pod_alive(&self, job_id: &JobId, pod_id: &PodId) -> bool {
        let mut jobs = self.inner.jobs.lock();
        let Some(job) = jobs.get_mut(job_id) else {
            return false;
        };
        let Some(pod) = job.pods.get(pod_id) else {
            return false;
        };
        let now = self.inner.clock.epoch_us();
        let dead_after = self.inner.config.pod_dead_time.as_micros() as u64;
        if now.saturating_sub(pod.heartbeat_time) > dead_after {
            tracing::info!(
                job = %job_id,
                pod = %pod_id,
                heartbeat = pod.heartbeat_time,
                now,
                "pod heartbeat expired, removing"
            );
            job.pods.remove(pod_id);
            return false;
        }
        true
    }
}

#[cfg(test)]
#[path = "liveness_tests.rs"]
mod tests;
