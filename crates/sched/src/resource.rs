// SPDX-License-Identifier: MIT

//! Multi-dimensional resource quantities and requirements.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Storage medium backing a volume.
///
/// `Tmpfs` volumes are carved out of agent memory rather than devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Medium {
    Ssd,
    Disk,
    Tmpfs,
}

ov_core::simple_display! {
    Medium {
        Ssd => "ssd",
        Disk => "disk",
        Tmpfs => "tmpfs",
    }
}

/// One requested volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub medium: Medium,
    pub size: u64,
}

/// One requested host port. `None` asks for any free port from the agent's
/// dynamic range; `Some(p)` binds exactly `p`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRequest {
    #[serde(default)]
    pub port: Option<u16>,
}

/// Resource quantities, used both for requests and for concrete
/// allocations (where dynamic ports have been resolved).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub millicores: u64,
    pub memory: u64,
    #[serde(default)]
    pub volumes: Vec<Volume>,
    #[serde(default)]
    pub ports: BTreeMap<String, PortRequest>,
}

impl Resource {
    /// Total size of tmpfs volumes, which count against agent memory.
    pub fn tmpfs_total(&self) -> u64 {
        self.volumes
            .iter()
            .filter(|v| v.medium == Medium::Tmpfs)
            .map(|v| v.size)
            .sum()
    }
}

/// What one container needs from an agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Placement label; empty means any agent.
    #[serde(default)]
    pub label: String,
    pub res: Resource,
}

/// Why an agent cannot host a container.
///
/// Feasibility checks run in a fixed order; the first failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceError {
    #[error("agent does not carry the required label")]
    LabelMismatch,
    #[error("insufficient cpu")]
    NoCpu,
    #[error("insufficient memory")]
    NoMemory,
    #[error("insufficient capacity on the requested medium")]
    NoMedium,
    #[error("volume count exceeds free devices")]
    NoDevice,
    #[error("dynamic port range exhausted")]
    NoPort,
    #[error("host port already bound")]
    PortConflict,
    #[error("insufficient memory for tmpfs volumes")]
    NoMemoryForTmpfs,
}
