// SPDX-License-Identifier: MIT

//! Agent registry entries and the feasibility check.
//!
//! An agent advertises totals (cpu, memory, storage devices, a dynamic port
//! range, labels); `can_put` decides whether a requirement fits and `put` /
//! `evict` keep the assigned-resource bookkeeping consistent with the
//! containers attached to the agent.

use crate::container::{Container, ContainerId};
use crate::resource::{Medium, PortRequest, Requirement, Resource, ResourceError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One storage device on an agent. A device hosts at most one volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub medium: Medium,
    pub size: u64,
    /// Container currently holding this device, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<ContainerId>,
}

/// Totals an agent advertises when it registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub millicores: u64,
    pub memory: u64,
    /// Storage devices as (medium, size) pairs.
    #[serde(default)]
    pub devices: Vec<(Medium, u64)>,
    /// Inclusive dynamic port range.
    pub port_base: u16,
    pub port_count: u16,
    #[serde(default)]
    pub labels: BTreeSet<String>,
}

impl Default for AgentSpec {
    fn default() -> Self {
        Self {
            millicores: 0,
            memory: 0,
            devices: Vec::new(),
            port_base: 1026,
            port_count: 1000,
            labels: BTreeSet::new(),
        }
    }
}

/// A worker host participating in the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    endpoint: String,
    labels: BTreeSet<String>,
    cpu_total: u64,
    mem_total: u64,
    cpu_assigned: u64,
    /// Includes tmpfs carve-outs of hosted containers.
    mem_assigned: u64,
    devices: Vec<Device>,
    port_base: u16,
    port_count: u16,
    bound_ports: BTreeSet<u16>,
    containers: Vec<ContainerId>,
}

impl Agent {
    pub fn new(endpoint: impl Into<String>, spec: AgentSpec) -> Self {
        Self {
            endpoint: endpoint.into(),
            labels: spec.labels,
            cpu_total: spec.millicores,
            mem_total: spec.memory,
            cpu_assigned: 0,
            mem_assigned: 0,
            devices: spec
                .devices
                .into_iter()
                .map(|(medium, size)| Device { medium, size, holder: None })
                .collect(),
            port_base: spec.port_base,
            port_count: spec.port_count,
            bound_ports: BTreeSet::new(),
            containers: Vec::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn containers(&self) -> &[ContainerId] {
        &self.containers
    }

    pub fn cpu_assigned(&self) -> u64 {
        self.cpu_assigned
    }

    pub fn mem_assigned(&self) -> u64 {
        self.mem_assigned
    }

    /// Mean of the cpu and memory load fractions; the placement loop prefers
    /// the lowest.
    pub fn assigned_fraction(&self) -> f64 {
        let frac = |assigned: u64, total: u64| {
            if total == 0 {
                1.0
            } else {
                assigned as f64 / total as f64
            }
        };
        (frac(self.cpu_assigned, self.cpu_total) + frac(self.mem_assigned, self.mem_total)) / 2.0
    }

    /// Feasibility check. Checks run in a fixed order; the first failure is
    /// the reported error.
    pub fn can_put(&self, require: &Requirement) -> Result<(), ResourceError> {
        if !require.label.is_empty() && !self.labels.contains(&require.label) {
            return Err(ResourceError::LabelMismatch);
        }
        let res = &require.res;
        if self.cpu_assigned.saturating_add(res.millicores) > self.cpu_total {
            return Err(ResourceError::NoCpu);
        }
        if self.mem_assigned.saturating_add(res.memory) > self.mem_total {
            return Err(ResourceError::NoMemory);
        }
        for medium in [Medium::Ssd, Medium::Disk] {
            self.check_devices(res, medium)?;
        }
        self.check_ports(res)?;
        let tmpfs = res.tmpfs_total();
        if tmpfs > 0
            && self.mem_assigned.saturating_add(res.memory).saturating_add(tmpfs) > self.mem_total
        {
            return Err(ResourceError::NoMemoryForTmpfs);
        }
        Ok(())
    }

    /// Device feasibility for one medium: volumes and free devices are
    /// paired 1:1, largest first. A pair that does not fit is a medium
    /// failure; volumes left without a device are a device-count failure.
    fn check_devices(&self, res: &Resource, medium: Medium) -> Result<(), ResourceError> {
        let wanted = sorted_volume_sizes(res, medium);
        if wanted.is_empty() {
            return Ok(());
        }
        let free = self.free_device_sizes(medium);
        for (size, capacity) in wanted.iter().zip(&free) {
            if size > capacity {
                return Err(ResourceError::NoMedium);
            }
        }
        if wanted.len() > free.len() {
            return Err(ResourceError::NoDevice);
        }
        Ok(())
    }

    fn check_ports(&self, res: &Resource) -> Result<(), ResourceError> {
        let mut wanted_static = BTreeSet::new();
        let mut dynamic = 0usize;
        for request in res.ports.values() {
            match request.port {
                Some(port) => {
                    if self.bound_ports.contains(&port) || !wanted_static.insert(port) {
                        return Err(ResourceError::PortConflict);
                    }
                }
                None => dynamic += 1,
            }
        }
        if dynamic > self.free_dynamic_ports(&wanted_static) {
            return Err(ResourceError::NoPort);
        }
        Ok(())
    }

    fn free_device_sizes(&self, medium: Medium) -> Vec<u64> {
        let mut free: Vec<u64> = self
            .devices
            .iter()
            .filter(|d| d.medium == medium && d.holder.is_none())
            .map(|d| d.size)
            .collect();
        free.sort_unstable_by(|a, b| b.cmp(a));
        free
    }

    fn free_dynamic_ports(&self, also_taken: &BTreeSet<u16>) -> usize {
        self.dynamic_range()
            .filter(|p| !self.bound_ports.contains(p) && !also_taken.contains(p))
            .count()
    }

    fn dynamic_range(&self) -> impl Iterator<Item = u16> + '_ {
        (0..self.port_count).filter_map(move |i| self.port_base.checked_add(i))
    }

    /// Commit a feasible container onto this agent.
    ///
    /// Resolves dynamic ports, takes devices, charges cpu and memory
    /// (including tmpfs), and fills `container.allocated`. The container's
    /// requirement is exactly what `evict` later releases.
    pub fn put(&mut self, container: &mut Container) -> Result<(), ResourceError> {
        self.can_put(&container.require)?;
        let res = container.require.res.clone();

        // Resolve every port before mutating anything.
        let mut taken = BTreeSet::new();
        let mut allocated_ports = BTreeMap::new();
        for (name, request) in &res.ports {
            let port = match request.port {
                Some(port) => port,
                None => self
                    .dynamic_range()
                    .find(|p| !self.bound_ports.contains(p) && !taken.contains(p))
                    .ok_or(ResourceError::NoPort)?,
            };
            taken.insert(port);
            allocated_ports.insert(name.clone(), PortRequest { port: Some(port) });
        }

        self.cpu_assigned = self.cpu_assigned.saturating_add(res.millicores);
        self.mem_assigned =
            self.mem_assigned.saturating_add(res.memory).saturating_add(res.tmpfs_total());
        self.bound_ports.extend(taken.iter().copied());
        for medium in [Medium::Ssd, Medium::Disk] {
            self.take_devices(&res, medium, &container.id);
        }
        self.containers.push(container.id.clone());

        container.allocated = Resource {
            millicores: res.millicores,
            memory: res.memory,
            volumes: res.volumes.clone(),
            ports: allocated_ports,
        };
        container.agent = Some(self.endpoint.clone());
        container.last_error = None;
        Ok(())
    }

    /// Pair volumes with free devices largest-first, matching the order
    /// `check_devices` validated.
    fn take_devices(&mut self, res: &Resource, medium: Medium, holder: &ContainerId) {
        let wanted = sorted_volume_sizes(res, medium);
        if wanted.is_empty() {
            return;
        }
        let mut free: Vec<usize> = (0..self.devices.len())
            .filter(|&i| self.devices[i].medium == medium && self.devices[i].holder.is_none())
            .collect();
        free.sort_unstable_by(|&a, &b| self.devices[b].size.cmp(&self.devices[a].size));
        for (slot, _) in free.into_iter().zip(&wanted) {
            self.devices[slot].holder = Some(holder.clone());
        }
    }

    /// Release everything a hosted container held and detach it.
    ///
    /// No-op when the container is not on this agent.
    pub fn evict(&mut self, container: &mut Container) {
        if !self.containers.iter().any(|id| *id == container.id) {
            return;
        }
        self.containers.retain(|id| *id != container.id);
        let res = &container.require.res;
        self.cpu_assigned = self.cpu_assigned.saturating_sub(res.millicores);
        self.mem_assigned =
            self.mem_assigned.saturating_sub(res.memory).saturating_sub(res.tmpfs_total());
        for device in &mut self.devices {
            if device.holder.as_ref() == Some(&container.id) {
                device.holder = None;
            }
        }
        for request in container.allocated.ports.values() {
            if let Some(port) = request.port {
                self.bound_ports.remove(&port);
            }
        }
        container.allocated = Resource::default();
        container.agent = None;
    }
}

fn sorted_volume_sizes(res: &Resource, medium: Medium) -> Vec<u64> {
    let mut wanted: Vec<u64> = res
        .volumes
        .iter()
        .filter(|v| v.medium == medium)
        .map(|v| v.size)
        .collect();
    wanted.sort_unstable_by(|a, b| b.cmp(a));
    wanted
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
