// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ov-master: the job lifecycle manager of the Overseer master plane.
//!
//! [`JobManager`] owns the job index and drives each job through its state
//! machine as workers pull work. Periodic aging checkers advance rollouts
//! and teardowns; per-pod liveness checkers evict silent pods. The resource
//! manager sibling is reached through an opaque asynchronous request
//! channel ([`ResmanHandle`]).

pub mod error;
pub mod manager;
pub mod resman;

pub use error::JobError;
pub use manager::JobManager;
pub use resman::{ResmanHandle, ResmanRequest};
