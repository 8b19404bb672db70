// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ov-sched: resource scheduler for the Overseer master plane.
//!
//! Binds container replicas to agents under multi-dimensional resource
//! constraints: cpu, memory, storage devices per medium, host ports, and
//! label placement. Feasibility lives on [`Agent`]; the placement loop and
//! group bookkeeping live on [`Scheduler`].

pub mod agent;
pub mod container;
pub mod resource;
pub mod scheduler;

pub use agent::{Agent, AgentSpec, Device};
pub use container::{Container, ContainerGroup, ContainerId, ContainerStatus, GroupId};
pub use resource::{Medium, PortRequest, Requirement, Resource, ResourceError, Volume};
pub use scheduler::Scheduler;
