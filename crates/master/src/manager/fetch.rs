// SPDX-License-Identifier: MIT

//! Worker fetch handling: the first-fetch transition, then per-status
//! dispatch.
//!
//! A fetch both heartbeats the pod and picks up the next action code. The
//! admission rules hold the rollout to the deploy policy: at most `step`
//! pods deploying at once (violators are told to exit) and at most
//! `replica` pods total (excess workers are told to back off and retry).

use super::JobManager;
use crate::error::JobError;
use ov_core::{
    transition, Clock, FetchAction, Job, JobEvent, JobStatus, PodId, PodInfo, PodStatus,
    UpdateAction,
};
use ov_store::MetaStore;
use ov_wire::{FetchRequest, FetchResponse, Status};

impl<S: MetaStore, C: Clock> JobManager<S, C> {
    /// Handle one worker fetch.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, JobError> {
        let (response, snapshot, new_pod) = {
            let mut jobs = self.inner.jobs.lock();
            let Some(job) = jobs.get_mut(&request.job_id) else {
                tracing::warn!(
                    job = %request.job_id,
                    pod = %request.pod_id,
                    worker = %request.endpoint,
                    "fetch for unknown job"
                );
                return Err(JobError::NotFound(request.job_id.clone()));
            };

            // First fetch moves a pending job to running.
            let snapshot = if transition(job.status, JobEvent::Fetch).is_some() {
                Some(self.apply_event(job, JobEvent::Fetch, None)?)
            } else {
                None
            };

            let now = self.inner.clock.epoch_us();
            let (action, new_pod) = match job.status {
                JobStatus::Pending | JobStatus::Running => {
                    self.pod_heartbeat(job, request, now)
                }
                JobStatus::Updating => self.update_pod(job, request, now),
                JobStatus::Destroying | JobStatus::Finished => (FetchAction::Terminate, None),
            };

            let response = FetchResponse {
                status: Status::from(action),
                pod: Some(job.desc.pod.clone()),
                update_time: job.update_time,
            };
            (response, snapshot, new_pod)
        };

        if let Some(job) = snapshot {
            self.persist(&job).await;
        }
        if let Some(pod_id) = new_pod {
            self.spawn_pod_checker(request.job_id.clone(), pod_id);
        }
        Ok(response)
    }

    /// Dispatch for pending and running jobs: refresh known pods, admit new
    /// ones under the deploy policy.
    fn pod_heartbeat(
        &self,
        job: &mut Job,
        request: &FetchRequest,
        now: u64,
    ) -> (FetchAction, Option<PodId>) {
        if job.pods.contains_key(&request.pod_id) {
            return (self.refresh_known_pod(job, request, now), None);
        }

        if request.status != PodStatus::Pending {
            // A pod that predates this master re-registers with its state.
            tracing::info!(
                job = %job.id,
                pod = %request.pod_id,
                worker = %request.endpoint,
                "pod re-registered"
            );
            let pod_id = create_pod(job, request, now);
            if let Some(pod) = job.pods.get_mut(&pod_id) {
                pod.status = request.status;
                pod.start_time = request.start_time;
            }
            return (FetchAction::Ok, Some(pod_id));
        }

        match self.admit_new_pod(job, request, now) {
            Ok(pod_id) => (FetchAction::Ok, Some(pod_id)),
            Err(action) => (action, None),
        }
    }

    /// Dispatch for updating jobs: same admission as the heartbeat path,
    /// plus the rolling-update protocol for known pods.
    fn update_pod(
        &self,
        job: &mut Job,
        request: &FetchRequest,
        now: u64,
    ) -> (FetchAction, Option<PodId>) {
        if !job.pods.contains_key(&request.pod_id) {
            if request.status != PodStatus::Pending {
                let pod_id = create_pod(job, request, now);
                if let Some(pod) = job.pods.get_mut(&pod_id) {
                    pod.status = request.status;
                    pod.start_time = request.start_time;
                }
                return (FetchAction::Ok, Some(pod_id));
            }
            return match self.admit_new_pod(job, request, now) {
                Ok(pod_id) => (FetchAction::Ok, Some(pod_id)),
                Err(action) => (action, None),
            };
        }

        if request.status.deploy_complete() {
            job.deploying_pods.remove(&request.pod_id);
        }
        let job_id = job.id.clone();
        let job_update_time = job.update_time;
        let current_version = job.current_version.clone();
        let action = job.action;
        let Some(pod) = job.pods.get_mut(&request.pod_id) else {
            return (FetchAction::Terminate, None);
        };
        pod.heartbeat_time = now;
        pod.update_time = request.update_time;

        if job_update_time > pod.update_time {
            // Still on the old version: answer with the update action.
            let code = match action {
                UpdateAction::Null => FetchAction::Ok,
                UpdateAction::Reload => FetchAction::Reload,
                UpdateAction::Rebuild => FetchAction::Rebuild,
            };
            tracing::info!(job = %job_id, pod = %request.pod_id, code = %code, "pod behind update");
            (code, None)
        } else {
            pod.version = current_version;
            pod.update_time = job_update_time;
            (FetchAction::Ok, None)
        }
    }

    /// Refresh a known pod from its heartbeat, handling worker replacement.
    fn refresh_known_pod(&self, job: &mut Job, request: &FetchRequest, now: u64) -> FetchAction {
        let job_id = job.id.clone();
        let current_version = job.current_version.clone();
        let job_update_time = job.update_time;
        let Some(pod) = job.pods.get_mut(&request.pod_id) else {
            return FetchAction::Terminate;
        };

        if pod.endpoint != request.endpoint {
            if request.start_time < pod.start_time {
                // A replaced worker still fetching must exit.
                tracing::warn!(
                    job = %job_id,
                    pod = %request.pod_id,
                    worker = %request.endpoint,
                    "stale worker rejected"
                );
                return FetchAction::Terminate;
            }
            pod.endpoint = request.endpoint.clone();
            pod.status = PodStatus::Deploying;
            pod.version = current_version;
            pod.start_time = request.start_time;
            pod.update_time = job_update_time;
            pod.heartbeat_time = now;
            tracing::info!(
                job = %job_id,
                pod = %request.pod_id,
                worker = %request.endpoint,
                "worker replaced"
            );
            return FetchAction::Ok;
        }

        pod.heartbeat_time = now;
        pod.status = request.status;
        if request.status.deploy_complete() {
            job.deploying_pods.remove(&request.pod_id);
        }
        FetchAction::Ok
    }

    /// Admission for a brand-new pod: the step gate rejects outright, the
    /// replica cap asks the worker to retry later.
    fn admit_new_pod(
        &self,
        job: &mut Job,
        request: &FetchRequest,
        now: u64,
    ) -> Result<PodId, FetchAction> {
        job.prune_deploying();
        if job.deploying_pods.len() as u32 >= job.desc.deploy.step {
            tracing::warn!(
                job = %job.id,
                deploying = job.deploying_pods.len(),
                step = job.desc.deploy.step,
                "step gate rejects new pod"
            );
            return Err(FetchAction::Terminate);
        }
        if job.pods.len() as u32 >= job.desc.deploy.replica {
            tracing::warn!(
                job = %job.id,
                pods = job.pods.len(),
                replica = job.desc.deploy.replica,
                "replica cap denies new pod"
            );
            return Err(FetchAction::Deny);
        }
        let pod_id = create_pod(job, request, now);
        job.deploying_pods.insert(pod_id.clone());
        Ok(pod_id)
    }
}

/// Insert a fresh pod record for a fetching worker.
fn create_pod(job: &mut Job, request: &FetchRequest, now: u64) -> PodId {
    let pod = PodInfo {
        pod_id: request.pod_id.clone(),
        job_id: job.id.clone(),
        endpoint: request.endpoint.clone(),
        version: job.current_version.clone(),
        status: PodStatus::Deploying,
        start_time: now,
        update_time: job.update_time,
        heartbeat_time: now,
    };
    tracing::info!(job = %job.id, pod = %pod.pod_id, worker = %pod.endpoint, "pod created");
    job.pods.insert(request.pod_id.clone(), pod);
    request.pod_id.clone()
}

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;
