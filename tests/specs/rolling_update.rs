// SPDX-License-Identifier: MIT

//! Rolling update specs: reload for data-only changes, rebuild for
//! structural ones, recovery once every pod catches up.

use crate::prelude::*;

async fn running_job_with_pod(rig: &Rig) -> (JobId, u64) {
    let id = rig.manager.submit(desc("1.0", 1, 2)).await;
    rig.manager
        .fetch(&fetch_req(&id, "p1", "w1:8000", PodStatus::Pending, 1, 0))
        .await
        .unwrap();
    rig.manager
        .fetch(&fetch_req(&id, "p1", "w1:8000", PodStatus::Serving, 1, 0))
        .await
        .unwrap();
    let update_time = rig.manager.get_job_info(&id).unwrap().update_time;
    (id, update_time)
}

#[tokio::test]
async fn data_only_change_reloads_then_recovers() {
    let rig = rig();
    let (id, old_update_time) = running_job_with_pod(&rig).await;

    rig.clock.advance(Duration::from_secs(1));
    let mut next = desc("1.1", 1, 2);
    next.pod.tasks[0].data_packages[0].version = "1.1".to_string();
    rig.manager.update(&id, next).await.unwrap();
    assert_eq!(status_of(&rig, &id), Some(JobStatus::Updating));

    // The old pod is told to swap data packages in place.
    let response = rig
        .manager
        .fetch(&fetch_req(&id, "p1", "w1:8000", PodStatus::Running, 1, old_update_time))
        .await
        .unwrap();
    assert_eq!(response.status, Status::Reload);

    // The worker reloads and echoes the new update time; the pod is
    // stamped and the aging checker recovers the job on its own.
    let response = rig
        .manager
        .fetch(&fetch_req(&id, "p1", "w1:8000", PodStatus::Running, 1, response.update_time))
        .await
        .unwrap();
    assert_eq!(response.status, Status::Ok);

    let recovered =
        wait_until(|| status_of(&rig, &id) == Some(JobStatus::Running), Duration::from_secs(5))
            .await;
    assert!(recovered);

    let info = rig.manager.get_job_info(&id).unwrap();
    assert_eq!(info.pods[0].version, "1.1");
}

#[tokio::test]
async fn task_count_change_rebuilds_old_pods() {
    let rig = rig();
    let (id, old_update_time) = running_job_with_pod(&rig).await;

    rig.clock.advance(Duration::from_secs(1));
    let mut next = desc("2.0", 1, 2);
    next.pod.tasks.push(next.pod.tasks[0].clone());
    next.pod.tasks[1].id = "t1".to_string();
    rig.manager.update(&id, next).await.unwrap();

    let response = rig
        .manager
        .fetch(&fetch_req(&id, "p1", "w1:8000", PodStatus::Running, 1, old_update_time))
        .await
        .unwrap();
    assert_eq!(response.status, Status::Rebuild);

    // The worker rebuilds and re-registers on the new version.
    let response = rig
        .manager
        .fetch(&fetch_req(&id, "p1", "w1:8000", PodStatus::Deploying, 1, response.update_time))
        .await
        .unwrap();
    assert_eq!(response.status, Status::Ok);

    let recovered =
        wait_until(|| status_of(&rig, &id) == Some(JobStatus::Running), Duration::from_secs(5))
            .await;
    assert!(recovered);
    assert_eq!(rig.manager.get_job_info(&id).unwrap().pods[0].version, "2.0");
}

#[tokio::test]
async fn exe_version_bump_also_rebuilds() {
    let rig = rig();
    let (id, old_update_time) = running_job_with_pod(&rig).await;

    rig.clock.advance(Duration::from_secs(1));
    let mut next = desc("3.0", 1, 2);
    next.pod.tasks[0].exe_package.version = "2.0".to_string();
    rig.manager.update(&id, next).await.unwrap();

    let response = rig
        .manager
        .fetch(&fetch_req(&id, "p1", "w1:8000", PodStatus::Running, 1, old_update_time))
        .await
        .unwrap();
    assert_eq!(response.status, Status::Rebuild);
}
