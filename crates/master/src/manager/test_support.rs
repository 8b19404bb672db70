// SPDX-License-Identifier: MIT

//! Shared fixtures for manager tests.

use crate::manager::JobManager;
use crate::resman::{ResmanHandle, ResmanRequest};
use ov_core::{
    DeployPolicy, FakeClock, JobDescription, JobId, MasterConfig, Package, PodId, PodSpec,
    PodStatus, TaskSpec,
};
use ov_store::MemStore;
use ov_wire::FetchRequest;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub(crate) struct TestMaster {
    pub manager: JobManager<MemStore, FakeClock>,
    pub store: Arc<MemStore>,
    pub clock: FakeClock,
    pub resman_rx: mpsc::Receiver<ResmanRequest>,
}

/// Checker intervals are parked far out so tests drive every aging and
/// liveness tick by hand.
pub(crate) fn test_config() -> MasterConfig {
    MasterConfig {
        job_check_interval: Duration::from_secs(3600),
        pod_check_interval: Duration::from_secs(3600),
        pod_dead_time: Duration::from_secs(30),
        ..MasterConfig::default()
    }
}

pub(crate) fn master() -> TestMaster {
    let store = Arc::new(MemStore::new());
    let clock = FakeClock::new();
    let (resman, resman_rx) = ResmanHandle::channel(16, Duration::from_millis(200));
    let manager = JobManager::new(store.clone(), resman, test_config(), clock.clone());
    TestMaster { manager, store, clock, resman_rx }
}

pub(crate) fn desc(version: &str, step: u32, replica: u32) -> JobDescription {
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

pub(crate) fn fetch_req(
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
