// SPDX-License-Identifier: MIT

//! Group bookkeeping and the placement loop.
//!
//! All tables live behind one mutex. Containers are single-owner records in
//! one map; groups and agents reference them by id, so an eviction or a
//! group teardown never leaves a dangling reference. The mutex is never held
//! across an await point.

use crate::agent::{Agent, AgentSpec};
use crate::container::{Container, ContainerGroup, ContainerId, ContainerStatus, GroupId};
use crate::resource::Requirement;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct SchedTable {
    agents: BTreeMap<String, Agent>,
    groups: BTreeMap<GroupId, ContainerGroup>,
    containers: HashMap<ContainerId, Container>,
}

/// The resource scheduler: agent registry, container groups, placement.
///
/// A cheap clone handle over the shared tables, so the placement loop task
/// carries its own handle.
#[derive(Default, Clone)]
pub struct Scheduler {
    inner: Arc<Mutex<SchedTable>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent. Replaces any previous registration for the same
    /// endpoint, dropping its assignments, so a re-registering agent starts
    /// clean.
    pub fn add_agent(&self, endpoint: impl Into<String>, spec: AgentSpec) {
        let endpoint = endpoint.into();
        let mut table = self.inner.lock();
        if table.agents.contains_key(&endpoint) {
            table.detach_agent(&endpoint);
        }
        tracing::info!(agent = %endpoint, "agent registered");
        table.agents.insert(endpoint.clone(), Agent::new(endpoint, spec));
    }

    /// Deregister an agent, evicting everything it hosted.
    pub fn remove_agent(&self, endpoint: &str) {
        let mut table = self.inner.lock();
        table.detach_agent(endpoint);
        if table.agents.remove(endpoint).is_some() {
            tracing::info!(agent = %endpoint, "agent removed");
        }
    }

    /// Create a container group with `replica` pending containers.
    pub fn submit(&self, require: Requirement, replica: u32) -> GroupId {
        let mut table = self.inner.lock();
        let mut group = ContainerGroup::new(require.clone());
        group.replica = replica;
        let group_id = group.id.clone();
        for _ in 0..replica {
            let container = Container::new(group_id.clone(), require.clone());
            group.containers.push(container.id.clone());
            group.pending_queue.push_back(container.id.clone());
            table.containers.insert(container.id.clone(), container);
        }
        tracing::info!(group = %group_id, replica, "container group submitted");
        table.groups.insert(group_id.clone(), group);
        group_id
    }

    /// Raise the replica target by `n`, appending pending containers.
    pub fn scale_up(&self, group_id: &GroupId, n: u32) {
        let mut table = self.inner.lock();
        let Some(group) = table.groups.get_mut(group_id) else {
            return;
        };
        if group.killed {
            return;
        }
        group.replica += n;
        let require = group.require.clone();
        let mut created = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let container = Container::new(group_id.clone(), require.clone());
            group.containers.push(container.id.clone());
            group.pending_queue.push_back(container.id.clone());
            created.push(container);
        }
        for container in created {
            table.containers.insert(container.id.clone(), container);
        }
        tracing::info!(group = %group_id, n, "scaled up");
    }

    /// Lower the replica target by `n`, draining placed containers first and
    /// deleting queued ones outright.
    pub fn scale_down(&self, group_id: &GroupId, n: u32) {
        let mut table = self.inner.lock();
        let Some(group) = table.groups.get(group_id) else {
            return;
        };
        let mut victims: Vec<ContainerId> = Vec::with_capacity(n as usize);
        // Placed containers drain through the worker; newest queue entries
        // just disappear.
        for id in group.containers.iter().rev() {
            if victims.len() == n as usize {
                break;
            }
            let Some(container) = table.containers.get(id) else {
                continue;
            };
            if matches!(container.status, ContainerStatus::Running | ContainerStatus::Allocating) {
                victims.push(id.clone());
            }
        }
        for id in group.containers.iter().rev() {
            if victims.len() == n as usize {
                break;
            }
            let Some(container) = table.containers.get(id) else {
                continue;
            };
            if container.status == ContainerStatus::Pending && !victims.contains(id) {
                victims.push(id.clone());
            }
        }
        if let Some(group) = table.groups.get_mut(group_id) {
            group.replica = group.replica.saturating_sub(n);
        }
        for id in victims {
            match table.containers.get(&id).map(|c| c.status) {
                Some(ContainerStatus::Pending) => table.delete_container(&id),
                Some(_) => table.mark_destroying(&id),
                None => {}
            }
        }
        tracing::info!(group = %group_id, n, "scaled down");
    }

    /// Tear down a whole group: queued containers are deleted, placed ones
    /// marked destroying. The group record goes away once emptied.
    pub fn kill(&self, group_id: &GroupId) {
        let mut table = self.inner.lock();
        let Some(group) = table.groups.get_mut(group_id) else {
            return;
        };
        group.killed = true;
        group.replica = 0;
        let ids = group.containers.clone();
        for id in &ids {
            match table.containers.get(id).map(|c| c.status) {
                Some(ContainerStatus::Pending) => table.delete_container(id),
                Some(ContainerStatus::Destroying) | Some(ContainerStatus::Terminated) => {}
                Some(_) => table.mark_destroying(id),
                None => {}
            }
        }
        table.remove_group_if_empty(group_id);
        tracing::info!(group = %group_id, "container group killed");
    }

    /// Worker-reported status change.
    ///
    /// `Terminated` finalizes a draining container; `Error` evicts it so the
    /// placement loop can retry elsewhere. Anything else is recorded as-is.
    pub fn change_status(&self, container_id: &ContainerId, status: ContainerStatus) {
        let mut table = self.inner.lock();
        match status {
            ContainerStatus::Terminated => {
                table.evict_container(container_id);
            }
            ContainerStatus::Error => {
                if let Some(container) = table.containers.get_mut(container_id) {
                    container.status = ContainerStatus::Error;
                }
                table.evict_container(container_id);
            }
            other => {
                if let Some(container) = table.containers.get_mut(container_id) {
                    container.status = other;
                }
            }
        }
    }

    /// Containers currently attached to an agent.
    pub fn show_assignment(&self, endpoint: &str) -> Vec<Container> {
        let table = self.inner.lock();
        let Some(agent) = table.agents.get(endpoint) else {
            return Vec::new();
        };
        agent
            .containers()
            .iter()
            .filter_map(|id| table.containers.get(id).cloned())
            .collect()
    }

    /// Every container of a group, queue order first.
    pub fn show_container_group(&self, group_id: &GroupId) -> Vec<Container> {
        let table = self.inner.lock();
        let Some(group) = table.groups.get(group_id) else {
            return Vec::new();
        };
        group
            .containers
            .iter()
            .filter_map(|id| table.containers.get(id).cloned())
            .collect()
    }

    /// Run one placement pass: every group may drain at most one pending
    /// container. Returns the number of placements made.
    pub fn schedule_once(&self) -> usize {
        let mut table = self.inner.lock();
        let group_ids: Vec<GroupId> = table.groups.keys().cloned().collect();
        let mut placed = 0;
        for group_id in group_ids {
            if table.try_place_one(&group_id) {
                placed += 1;
            }
        }
        placed
    }

    /// Start the background placement loop. Runs until `shutdown` fires.
    pub fn start(&self, interval: Duration, shutdown: CancellationToken) {
        let sched = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {
                        sched.schedule_once();
                    }
                }
            }
            tracing::debug!("placement loop stopped");
        });
    }
}

impl SchedTable {
    /// Place the front of a group's queue on the least-loaded feasible
    /// agent. Infeasibility caches the error from the best-ranked agent.
    fn try_place_one(&mut self, group_id: &GroupId) -> bool {
        let Some(front) = self.groups.get(group_id).and_then(|g| g.pending_queue.front().cloned())
        else {
            return false;
        };

        let mut ranked: Vec<(f64, String)> = self
            .agents
            .values()
            .map(|a| (a.assigned_fraction(), a.endpoint().to_string()))
            .collect();
        ranked.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
        });

        let Some(container) = self.containers.get_mut(&front) else {
            // Stale queue entry; drop it.
            if let Some(group) = self.groups.get_mut(group_id) {
                group.pending_queue.pop_front();
            }
            return false;
        };

        let mut first_error = None;
        for (_, endpoint) in &ranked {
            let Some(agent) = self.agents.get_mut(endpoint) else {
                continue;
            };
            match agent.put(container) {
                Ok(()) => {
                    container.status = ContainerStatus::Allocating;
                    tracing::info!(
                        container = %container.id,
                        group = %group_id,
                        agent = %endpoint,
                        "container placed"
                    );
                    if let Some(group) = self.groups.get_mut(group_id) {
                        group.pending_queue.pop_front();
                    }
                    return true;
                }
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
        if first_error.is_some() {
            container.last_error = first_error;
        }
        false
    }

    /// Evict every container an agent hosts (used for removal and
    /// re-registration).
    fn detach_agent(&mut self, endpoint: &str) {
        let ids: Vec<ContainerId> = self
            .agents
            .get(endpoint)
            .map(|a| a.containers().to_vec())
            .unwrap_or_default();
        for id in ids {
            self.evict_container(&id);
        }
    }

    /// Release an eviction victim's resources and either requeue it (group
    /// still wants more replicas) or delete it.
    fn evict_container(&mut self, container_id: &ContainerId) {
        let Some(container) = self.containers.get_mut(container_id) else {
            return;
        };
        if let Some(endpoint) = container.agent.clone() {
            if let Some(agent) = self.agents.get_mut(&endpoint) {
                agent.evict(container);
            }
        }
        let group_id = container.group_id.clone();
        let live = self.live_count(&group_id, container_id);
        let target = self.groups.get(&group_id).map(|g| g.replica).unwrap_or(0);
        if live < target {
            if let Some(container) = self.containers.get_mut(container_id) {
                container.status = ContainerStatus::Pending;
            }
            if let Some(group) = self.groups.get_mut(&group_id) {
                if !group.pending_queue.contains(container_id) {
                    group.pending_queue.push_back(container_id.clone());
                }
            }
            tracing::debug!(container = %container_id, group = %group_id, "evicted, requeued");
        } else {
            self.delete_container(container_id);
            self.remove_group_if_empty(&group_id);
            tracing::debug!(container = %container_id, group = %group_id, "evicted, deleted");
        }
    }

    /// Containers of a group still counting toward the replica target,
    /// excluding one eviction victim.
    fn live_count(&self, group_id: &GroupId, excluding: &ContainerId) -> u32 {
        let Some(group) = self.groups.get(group_id) else {
            return 0;
        };
        group
            .containers
            .iter()
            .filter(|id| *id != excluding)
            .filter_map(|id| self.containers.get(id))
            .filter(|c| {
                !matches!(c.status, ContainerStatus::Destroying | ContainerStatus::Terminated)
            })
            .count() as u32
    }

    fn mark_destroying(&mut self, container_id: &ContainerId) {
        if let Some(container) = self.containers.get_mut(container_id) {
            container.status = ContainerStatus::Destroying;
        }
    }

    /// Drop a container from every table. Placed containers are evicted from
    /// their agent first so the accounting stays balanced.
    fn delete_container(&mut self, container_id: &ContainerId) {
        if let Some(container) = self.containers.get_mut(container_id) {
            if let Some(endpoint) = container.agent.clone() {
                if let Some(agent) = self.agents.get_mut(&endpoint) {
                    agent.evict(container);
                }
            }
        }
        if let Some(container) = self.containers.remove(container_id) {
            if let Some(group) = self.groups.get_mut(&container.group_id) {
                group.containers.retain(|id| id != container_id);
                group.pending_queue.retain(|id| id != container_id);
            }
        }
    }

    fn remove_group_if_empty(&mut self, group_id: &GroupId) {
        let remove = self
            .groups
            .get(group_id)
            .map(|g| g.killed && g.containers.is_empty())
            .unwrap_or(false);
        if remove {
            self.groups.remove(group_id);
            tracing::info!(group = %group_id, "container group removed");
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
