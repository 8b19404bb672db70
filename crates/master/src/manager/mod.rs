// SPDX-License-Identifier: MIT

//! The job manager: job index, state machine execution, persistence.
//!
//! One mutex protects the job index and every job's fields; all state
//! machine lookups and mutations happen under it. Durable-store writes run
//! after the lock is released, from a snapshot taken under it, and failures
//! are logged rather than propagated: in-memory state is authoritative and
//! the next successful write reconverges the store.
//!
//! [`JobManager`] is a cheap clone handle over the shared state, so checker
//! tasks carry the handle plus the ids they watch and re-look everything up
//! under the mutex on each tick.

mod aging;
mod fetch;
mod liveness;
#[cfg(test)]
pub(crate) mod test_support;

use crate::error::JobError;
use crate::resman::ResmanHandle;
use ov_core::{
    transition, Clock, Job, JobDescription, JobEvent, JobId, MasterConfig, Terminator,
    TransitionKind,
};
use ov_store::{JobStore, MetaStore, StoreError};
use ov_wire::{JobInfo, JobOverview};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct ManagerInner<S, C: Clock> {
    jobs: Mutex<HashMap<JobId, Job>>,
    store: JobStore<S>,
    resman: ResmanHandle,
    config: MasterConfig,
    clock: C,
    shutdown: CancellationToken,
}

/// Master-plane owner of all job records.
pub struct JobManager<S, C: Clock> {
    inner: Arc<ManagerInner<S, C>>,
}

impl<S, C: Clock> Clone for JobManager<S, C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<S: MetaStore, C: Clock> JobManager<S, C> {
    pub fn new(store: Arc<S>, resman: ResmanHandle, config: MasterConfig, clock: C) -> Self {
        let prefix = config.jobs_prefix();
        Self {
            inner: Arc::new(ManagerInner {
                jobs: Mutex::new(HashMap::new()),
                store: JobStore::new(store, prefix),
                resman,
                config,
                clock,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Stop every checker loop.
    pub fn stop(&self) {
        self.inner.shutdown.cancel();
    }

    /// Point outbound removal requests at a new resource-manager endpoint.
    pub fn set_resman_endpoint(&self, endpoint: impl Into<String>) {
        self.inner.resman.set_endpoint(endpoint);
    }

    /// Create a pending job from a submitted description.
    pub async fn submit(&self, desc: JobDescription) -> JobId {
        let id = JobId::generate();
        let job = Job::new(id.clone(), desc, self.inner.clock.epoch_us());
        tracing::info!(
            job = %id,
            name = %job.desc.name,
            step = job.desc.deploy.step,
            replica = job.desc.deploy.replica,
            version = %job.current_version,
            "job submitted"
        );
        self.persist(&job).await;
        self.inner.jobs.lock().insert(id.clone(), job);
        self.spawn_job_checker(id.clone());
        id
    }

    /// Swap in a new description.
    pub async fn update(&self, id: &JobId, desc: JobDescription) -> Result<(), JobError> {
        let snapshot = {
            let mut jobs = self.inner.jobs.lock();
            let job = jobs.get_mut(id).ok_or_else(|| JobError::NotFound(id.clone()))?;
            self.apply_event(job, JobEvent::Update, Some(desc))?
        };
        self.persist(&snapshot).await;
        Ok(())
    }

    /// Terminate a job on behalf of `user`.
    pub async fn terminate(
        &self,
        id: &JobId,
        user: impl Into<String>,
        hostname: impl Into<String>,
    ) -> Result<(), JobError> {
        let snapshot = {
            let mut jobs = self.inner.jobs.lock();
            let job = jobs.get_mut(id).ok_or_else(|| JobError::NotFound(id.clone()))?;
            job.terminator = Some(Terminator { user: user.into(), hostname: hostname.into() });
            self.apply_event(job, JobEvent::Remove, None)?
        };
        self.persist(&snapshot).await;
        Ok(())
    }

    /// Overview rows for every known job, ordered by id.
    pub fn list_jobs(&self) -> Vec<JobOverview> {
        let jobs = self.inner.jobs.lock();
        let mut overviews: Vec<JobOverview> = jobs.values().map(JobOverview::from).collect();
        overviews.sort_by(|a, b| a.job_id.as_str().cmp(b.job_id.as_str()));
        overviews
    }

    /// Full view of one job, pods included.
    pub fn get_job_info(&self, id: &JobId) -> Result<JobInfo, JobError> {
        let jobs = self.inner.jobs.lock();
        let job = jobs.get(id).ok_or_else(|| JobError::NotFound(id.clone()))?;
        Ok(JobInfo::from(job))
    }

    /// Boot-time reload: rebuild the index from the durable store and
    /// restart every checker. Returns the number of jobs restored.
    pub async fn reload(&self) -> Result<usize, StoreError> {
        let restored = self.inner.store.load_all().await?;
        let count = restored.len();
        for job in restored {
            let id = job.id.clone();
            let pod_ids: Vec<_> = job.pods.keys().cloned().collect();
            tracing::info!(job = %id, status = %job.status, pods = pod_ids.len(), "job reloaded");
            self.inner.jobs.lock().insert(id.clone(), job);
            self.spawn_job_checker(id.clone());
            for pod_id in pod_ids {
                self.spawn_pod_checker(id.clone(), pod_id);
            }
        }
        Ok(count)
    }

    /// Run the transition for `event`, commit the status, and return a
    /// snapshot to persist. Must be called with the job lock held.
    pub(crate) fn apply_event(
        &self,
        job: &mut Job,
        event: JobEvent,
        desc: Option<JobDescription>,
    ) -> Result<Job, JobError> {
        let Some(trans) = transition(job.status, event) else {
            tracing::info!(job = %job.id, status = %job.status, %event, "event rejected");
            return Err(JobError::StatusConflict { status: job.status, event });
        };
        self.run_transition(job, trans.kind, desc)?;
        job.status = trans.next;
        tracing::info!(job = %job.id, status = %job.status, "job status advanced");
        Ok(job.clone())
    }

    /// The transition actions. `Update` is the only one with work to do
    /// before the commit; clearing happens in the aging check, which is the
    /// single place finished jobs are destroyed.
    fn run_transition(
        &self,
        job: &mut Job,
        kind: TransitionKind,
        desc: Option<JobDescription>,
    ) -> Result<(), JobError> {
        match kind {
            TransitionKind::Start
            | TransitionKind::Recover
            | TransitionKind::Remove
            | TransitionKind::Clear => Ok(()),
            TransitionKind::Update => {
                let desc = desc.ok_or_else(|| {
                    JobError::Internal("update transition without a description".to_string())
                })?;
                job.apply_update(desc, self.inner.clock.epoch_us());
                tracing::info!(job = %job.id, action = %job.action, "description updated");
                Ok(())
            }
        }
    }

    /// Best-effort store write from a snapshot.
    pub(crate) async fn persist(&self, job: &Job) {
        if let Err(err) = self.inner.store.save(job).await {
            tracing::warn!(job = %job.id, %err, "failed to persist job record");
        }
    }

    #[cfg(test)]
    pub(crate) fn job_status(&self, id: &JobId) -> Option<ov_core::JobStatus> {
        self.inner.jobs.lock().get(id).map(|j| j.status)
    }

    #[cfg(test)]
    pub(crate) fn with_job<T>(&self, id: &JobId, f: impl FnOnce(&Job) -> T) -> Option<T> {
        self.inner.jobs.lock().get(id).map(f)
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
