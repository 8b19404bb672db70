// SPDX-License-Identifier: MIT

//! Shared fixtures for the scenario suite.

pub use ov_core::{
    DeployPolicy, FakeClock, JobDescription, JobId, JobStatus, MasterConfig, Package, PodId,
    PodSpec, PodStatus, TaskSpec,
};
pub use ov_master::{JobManager, ResmanHandle, ResmanRequest};
pub use ov_sched::{AgentSpec, ContainerStatus, GroupId, Requirement, Resource, Scheduler};
pub use ov_store::MemStore;
pub use ov_wire::{FetchRequest, Status};
pub use std::sync::Arc;
pub use std::time::Duration;
pub use tokio_util::sync::CancellationToken;

/// A master wired the way `ovd` wires it: in-memory store, fake clock, and
/// an in-process scheduler answering container-group removals.
pub struct Rig {
    pub manager: JobManager<MemStore, FakeClock>,
    pub store: Arc<MemStore>,
    pub clock: FakeClock,
    pub scheduler: Scheduler,
    /// Group ids the resource-manager bridge was asked to remove.
    pub removals: Arc<std::sync::Mutex<Vec<String>>>,
}

/// Aggressive intervals so re-armed checkers tick within test time.
pub fn quick_config() -> MasterConfig {
    MasterConfig {
        job_check_interval: Duration::from_millis(20),
        pod_check_interval: Duration::from_millis(20),
        pod_dead_time: Duration::from_millis(200),
        ..MasterConfig::default()
    }
}

/// Checkers parked far out, for scenarios that must observe intermediate
/// statuses without aging racing ahead.
pub fn parked_config() -> MasterConfig {
    MasterConfig {
        job_check_interval: Duration::from_secs(3600),
        pod_check_interval: Duration::from_secs(3600),
        ..MasterConfig::default()
    }
}

pub fn rig() -> Rig {
    rig_with(Arc::new(MemStore::new()), FakeClock::new(), quick_config())
}

/// Build a rig over an existing store, for restart scenarios.
pub fn rig_with_store(store: Arc<MemStore>, clock: FakeClock) -> Rig {
    rig_with(store, clock, quick_config())
}

pub fn rig_with(store: Arc<MemStore>, clock: FakeClock, config: MasterConfig) -> Rig {
    let scheduler = Scheduler::new();
    let removals = Arc::new(std::sync::Mutex::new(Vec::new()));
    let (resman, mut resman_rx) = ResmanHandle::channel(16, Duration::from_secs(1));

    // The removal-request bridge, as wired in the ovd binary.
    {
        let scheduler = scheduler.clone();
        let removals = Arc::clone(&removals);
        tokio::spawn(async move {
            while let Some(request) = resman_rx.recv().await {
                match request {
                    ResmanRequest::RemoveContainerGroup { group, reply, .. } => {
                        if let Ok(mut log) = removals.lock() {
                            log.push(group.to_string());
                        }
                        scheduler.kill(&GroupId::from(group.as_str()));
                        let _ = reply.send(true);
                    }
                }
            }
        });
    }

    let manager = JobManager::new(store.clone(), resman, config, clock.clone());
    Rig { manager, store, clock, scheduler, removals }
}

pub fn desc(version: &str, step: u32, replica: u32) -> JobDescription {
    JobDescription {
        name: "web".to_string(),
        version: version.to_string(),
        deploy: DeployPolicy { step, replica },
        pod: PodSpec {
            tasks: vec![TaskSpec {
                id: "t0".to_string(),
                exe_package: Package {
                    source: "ftp://pkg/web".to_string(),
                    version: "1.0".to_string(),
                },
                data_packages: vec![Package {
                    source: "ftp://data/web".to_string(),
                    version: "1.0".to_string(),
                }],
            }],
        },
    }
}

pub fn fetch_req(
    job_id: &JobId,
    pod_id: &str,
    endpoint: &str,
    status: PodStatus,
    start_time: u64,
    update_time: u64,
) -> FetchRequest {
    FetchRequest {
        job_id: job_id.clone(),
        pod_id: PodId::from(pod_id),
        endpoint: endpoint.to_string(),
        status,
        start_time,
        update_time,
    }
}

/// Current status of a job through the public surface; `None` once cleared.
pub fn status_of(rig: &Rig, id: &JobId) -> Option<JobStatus> {
    rig.manager.get_job_info(id).ok().map(|info| info.status)
}

/// Poll until `cond` holds or the deadline passes.
pub async fn wait_until(mut cond: impl FnMut() -> bool, deadline: Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
