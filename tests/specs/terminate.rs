// SPDX-License-Identifier: MIT

//! Terminate specs: drain, finish, clear.

use crate::prelude::*;

#[tokio::test]
async fn terminate_drains_pods_then_clears_the_job() {
    let rig = rig();
    let id = rig.manager.submit(desc("1.0", 1, 2)).await;
    rig.manager
        .fetch(&fetch_req(&id, "p1", "w1:8000", PodStatus::Pending, 1, 0))
        .await
        .unwrap();
    assert_eq!(status_of(&rig, &id), Some(JobStatus::Running));

    rig.manager.terminate(&id, "ops", "bastion").await.unwrap();
    assert_eq!(status_of(&rig, &id), Some(JobStatus::Destroying));

    // Every further fetch tells the worker to exit.
    let response = rig
        .manager
        .fetch(&fetch_req(&id, "p1", "w1:8000", PodStatus::Running, 1, 0))
        .await
        .unwrap();
    assert_eq!(response.status, Status::Terminate);

    // The worker goes silent; liveness evicts the pod, aging finishes the
    // job, and the clear pass removes it from the index and the store and
    // notifies the resource manager.
    rig.clock.advance(Duration::from_secs(1));
    let cleared = wait_until(
        || {
            let removal_logged = rig
                .removals
                .lock()
                .map(|log| !log.is_empty())
                .unwrap_or(false);
            status_of(&rig, &id).is_none() && rig.store.is_empty() && removal_logged
        },
        Duration::from_secs(5),
    )
    .await;
    assert!(cleared);

    let removed = rig.removals.lock().unwrap_or_else(|e| e.into_inner()).clone();
    assert_eq!(removed, vec![id.to_string()]);
}

#[tokio::test]
async fn terminate_pending_job_clears_without_pods() {
    let rig = rig();
    let id = rig.manager.submit(desc("1.0", 1, 2)).await;
    rig.manager.terminate(&id, "ops", "bastion").await.unwrap();
    assert_eq!(status_of(&rig, &id), Some(JobStatus::Finished));

    let cleared = wait_until(
        || status_of(&rig, &id).is_none() && rig.store.is_empty(),
        Duration::from_secs(5),
    )
    .await;
    assert!(cleared);
}

#[tokio::test]
async fn terminate_unknown_job_reports_not_found() {
    let rig = rig();
    let err = rig
        .manager
        .terminate(&JobId::from("ghost"), "ops", "bastion")
        .await
        .unwrap_err();
    assert_eq!(ov_wire::Status::from(&err), Status::JobNotFound);
}
