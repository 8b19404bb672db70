// SPDX-License-Identifier: MIT

//! Per-job aging: the re-armed checker that advances rollouts and
//! teardowns.
//!
//! The checker task holds only the job id and re-looks it up under the
//! mutex on every tick, so a removed job simply ends its checker. Finished
//! jobs are cleared here and nowhere else.

use super::JobManager;
use crate::error::JobError;
use ov_core::{Clock, Job, JobEvent, JobId, JobStatus};
use ov_store::MetaStore;

enum Tick {
    /// Nothing to do, keep checking.
    Idle,
    /// A transition committed; persist this snapshot.
    Advanced(Job),
    /// The job finished; run cleanup and stop checking.
    Clear(Job),
    /// The job is gone.
    Gone,
}

impl<S: MetaStore, C: Clock> JobManager<S, C> {
    /// Arm the periodic checker for one job.
    pub(crate) fn spawn_job_checker(&self, id: JobId) {
        let manager = self.clone();
        let shutdown = self.inner.shutdown.clone();
        tokio::spawn(async move {
            let interval = manager.inner.config.job_check_interval;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                if !manager.check_job(&id).await {
                    break;
                }
            }
        });
    }

    /// One aging tick. Returns false when the checker should stop.
    pub(crate) async fn check_job(&self, id: &JobId) -> bool {
        let tick = {
            let mut jobs = self.inner.jobs.lock();
            let status = match jobs.get(id) {
                Some(job) => job.status,
                None => return false,
            };
            match status {
                JobStatus::Pending | JobStatus::Running => Tick::Idle,
                JobStatus::Updating => match jobs.get_mut(id) {
                    Some(job) => check_updating(self, job),
                    None => Tick::Gone,
                },
                JobStatus::Destroying => match jobs.get_mut(id) {
                    Some(job) => check_destroying(self, job),
                    None => Tick::Gone,
                },
                JobStatus::Finished => match jobs.remove(id) {
                    Some(job) => Tick::Clear(job),
                    None => Tick::Gone,
                },
            }
        };
        match tick {
            Tick::Idle => true,
            Tick::Advanced(snapshot) => {
                self.persist(&snapshot).await;
                true
            }
            Tick::Clear(job) => {
                self.clear_job(job).await;
                false
            }
            Tick::Gone => false,
        }
    }

    /// Remove a finished job everywhere: ask the resource manager to drop
    /// its container group, then delete the durable record. The in-memory
    /// entry is already out of the index.
    async fn clear_job(&self, job: Job) {
        tracing::info!(job = %job.id, "clearing finished job");
        self.inner.resman.remove_container_group(job.id.clone(), job.terminator.clone());
        if let Err(err) = self.inner.store.remove(&job.id).await {
            tracing::warn!(job = %job.id, %err, "failed to delete job record");
        }
    }
}

/// Post `UpdateFinish` once every pod has caught up.
fn check_updating<S: MetaStore, C: Clock>(manager: &JobManager<S, C>, job: &mut Job) -> Tick {
    if !job.all_pods_current() {
        return Tick::Idle;
    }
    match manager.apply_event(job, JobEvent::UpdateFinish, None) {
        Ok(snapshot) => Tick::Advanced(snapshot),
        Err(JobError::StatusConflict { .. }) => Tick::Idle,
        Err(err) => {
            tracing::warn!(job = %job.id, %err, "update-finish transition failed");
            Tick::Idle
        }
    }
}

/// Post `RemoveFinish` once the last pod is gone.
fn check_destroying<S: MetaStore, C: Clock>(manager: &JobManager<S, C>, job: &mut Job) -> Tick {
    if !job.pods.is_empty() {
        return Tick::Idle;
    }
    match manager.apply_event(job, JobEvent::RemoveFinish, None) {
        Ok(snapshot) => Tick::Advanced(snapshot),
        Err(JobError::StatusConflict { .. }) => Tick::Idle,
        Err(err) => {
            tracing::warn!(job = %job.id, %err, "remove-finish transition failed");
            Tick::Idle
        }
    }
}

#[cfg(test)]
#[path = "aging_tests.rs"]
mod tests;
