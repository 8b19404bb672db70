// SPDX-License-Identifier: MIT

//! Submit-and-deploy lifecycle specs.

use crate::prelude::*;

#[tokio::test]
async fn fresh_submit_first_fetch_runs_the_job() {
    let rig = rig();
    let id = rig.manager.submit(desc("1.0", 1, 2)).await;
    assert_eq!(status_of(&rig, &id), Some(JobStatus::Pending));

    let response = rig
        .manager
        .fetch(&fetch_req(&id, "p1", "w1:8000", PodStatus::Pending, 1, 0))
        .await
        .unwrap();
    assert_eq!(response.status, Status::Ok);
    assert_eq!(status_of(&rig, &id), Some(JobStatus::Running));

    let info = rig.manager.get_job_info(&id).unwrap();
    assert_eq!(info.pods.len(), 1);
    assert_eq!(info.pods[0].pod_id, "p1");

    // The deploy step is 1 and p1 is still deploying: a second new pod is
    // rejected outright.
    let response = rig
        .manager
        .fetch(&fetch_req(&id, "p2", "w2:8000", PodStatus::Pending, 2, 0))
        .await
        .unwrap();
    assert_eq!(response.status, Status::Terminate);
}

#[tokio::test]
async fn step_slot_frees_once_a_pod_serves() {
    let rig = rig();
    let id = rig.manager.submit(desc("1.0", 1, 2)).await;
    rig.manager
        .fetch(&fetch_req(&id, "p1", "w1:8000", PodStatus::Pending, 1, 0))
        .await
        .unwrap();

    let response = rig
        .manager
        .fetch(&fetch_req(&id, "p1", "w1:8000", PodStatus::Serving, 1, 0))
        .await
        .unwrap();
    assert_eq!(response.status, Status::Ok);

    let response = rig
        .manager
        .fetch(&fetch_req(&id, "p2", "w2:8000", PodStatus::Pending, 2, 0))
        .await
        .unwrap();
    assert_eq!(response.status, Status::Ok);

    let info = rig.manager.get_job_info(&id).unwrap();
    assert_eq!(info.pods.len(), 2);
}

#[tokio::test]
async fn listing_tracks_pod_progress() {
    let rig = rig();
    let id = rig.manager.submit(desc("1.0", 2, 3)).await;
    rig.manager
        .fetch(&fetch_req(&id, "p1", "w1:8000", PodStatus::Pending, 1, 0))
        .await
        .unwrap();
    rig.manager
        .fetch(&fetch_req(&id, "p1", "w1:8000", PodStatus::Running, 1, 0))
        .await
        .unwrap();
    rig.manager
        .fetch(&fetch_req(&id, "p2", "w2:8000", PodStatus::Pending, 2, 0))
        .await
        .unwrap();

    let listing = rig.manager.list_jobs();
    assert_eq!(listing.len(), 1);
    let row = &listing[0];
    assert_eq!(row.job_id, id);
    assert_eq!(row.running, 1);
    assert_eq!(row.deploying, 1);
    assert_eq!(row.death, 0);
    assert_eq!(row.pending, 1);
}
