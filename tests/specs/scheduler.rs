// SPDX-License-Identifier: MIT

//! Scheduler feasibility and placement specs.

use crate::prelude::*;
use ov_sched::ResourceError;

fn prod_agent() -> AgentSpec {
    AgentSpec {
        millicores: 4000,
        memory: 8,
        labels: ["prod".to_string()].into(),
        ..AgentSpec::default()
    }
}

fn prod_require() -> Requirement {
    Requirement {
        label: "prod".to_string(),
        res: Resource { millicores: 2000, memory: 3, ..Resource::default() },
    }
}

#[tokio::test]
async fn both_replicas_land_then_scale_up_starves_on_cpu() {
    let rig = rig();
    rig.scheduler.add_agent("a:7100", prod_agent());
    let group = rig.scheduler.submit(prod_require(), 2);

    assert_eq!(rig.scheduler.schedule_once(), 1);
    assert_eq!(rig.scheduler.schedule_once(), 1);
    assert_eq!(rig.scheduler.show_assignment("a:7100").len(), 2);

    rig.scheduler.scale_up(&group, 1);
    assert_eq!(rig.scheduler.schedule_once(), 0);

    let stuck: Vec<_> = rig
        .scheduler
        .show_container_group(&group)
        .into_iter()
        .filter(|c| c.status == ContainerStatus::Pending)
        .collect();
    assert_eq!(stuck.len(), 1);
    assert_eq!(stuck[0].last_error, Some(ResourceError::NoCpu));
}

#[tokio::test]
async fn placement_loop_places_in_the_background() {
    let rig = rig();
    rig.scheduler.add_agent("a:7100", prod_agent());
    let group = rig.scheduler.submit(prod_require(), 2);

    let shutdown = CancellationToken::new();
    rig.scheduler.start(Duration::from_millis(10), shutdown.clone());

    let group_for_wait = group.clone();
    let placed = wait_until(
        || {
            rig.scheduler
                .show_container_group(&group_for_wait)
                .iter()
                .all(|c| c.status == ContainerStatus::Allocating)
        },
        Duration::from_secs(5),
    )
    .await;
    assert!(placed);
    shutdown.cancel();
}
