// SPDX-License-Identifier: MIT

//! Containers and container groups: the scheduler-side mirror of a job's
//! desired replicas.

use crate::resource::{Requirement, Resource, ResourceError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

ov_core::define_id! {
    /// Unique identifier for a container group.
    pub struct GroupId("grp-");
}

ov_core::define_id! {
    /// Unique identifier for one container replica.
    pub struct ContainerId("ctn-");
}

/// Lifecycle status of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerStatus {
    /// Waiting in its group's pending queue.
    Pending,
    /// Placed on an agent; the worker has not confirmed yet.
    Allocating,
    /// Worker confirmed the container is up.
    Running,
    /// Worker reported a fault.
    Error,
    /// Marked for teardown; waiting on the worker.
    Destroying,
    /// Worker confirmed teardown.
    Terminated,
}

ov_core::simple_display! {
    ContainerStatus {
        Pending => "pending",
        Allocating => "allocating",
        Running => "running",
        Error => "error",
        Destroying => "destroying",
        Terminated => "terminated",
    }
}

/// One replica tracked by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    pub group_id: GroupId,
    pub status: ContainerStatus,
    pub require: Requirement,
    /// Concrete allocation once placed (dynamic ports resolved).
    #[serde(default)]
    pub allocated: Resource,
    /// Endpoint of the hosting agent once placed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// Last placement failure, kept for observability while the container
    /// waits in the queue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<ResourceError>,
}

impl Container {
    pub fn new(group_id: GroupId, require: Requirement) -> Self {
        Self {
            id: ContainerId::generate(),
            group_id,
            status: ContainerStatus::Pending,
            require,
            allocated: Resource::default(),
            agent: None,
            last_error: None,
        }
    }
}

/// A job's worth of identical replicas plus its placement backlog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerGroup {
    pub id: GroupId,
    /// Target replica count.
    pub replica: u32,
    pub require: Requirement,
    /// Every container belonging to this group.
    pub containers: Vec<ContainerId>,
    /// Containers awaiting placement, oldest first.
    pub pending_queue: VecDeque<ContainerId>,
    /// Set once the group is killed; the group is dropped when emptied.
    #[serde(default)]
    pub killed: bool,
}

impl ContainerGroup {
    pub fn new(require: Requirement) -> Self {
        Self {
            id: GroupId::generate(),
            replica: 0,
            require,
            containers: Vec::new(),
            pending_queue: VecDeque::new(),
            killed: false,
        }
    }
}
