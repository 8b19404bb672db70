// SPDX-License-Identifier: MIT

//! The job state machine.
//!
//! [`transition`] is the entire machine: an immutable mapping from
//! (status, event) to the next status plus the transition action to run
//! before committing it. Pairs outside the table are conflicts, surfaced to
//! callers as a status-conflict error. `Finished` accepts no events.

use crate::job::JobStatus;
use serde::{Deserialize, Serialize};

/// Events that drive a job through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobEvent {
    /// A worker pulled the job for the first time or heartbeated.
    Fetch,
    /// A client swapped in a new description.
    Update,
    /// Every pod has caught up to the latest description.
    UpdateFinish,
    /// A client terminated the job.
    Remove,
    /// All pods are gone.
    RemoveFinish,
}

crate::simple_display! {
    JobEvent {
        Fetch => "fetch",
        Update => "update",
        UpdateFinish => "update_finish",
        Remove => "remove",
        RemoveFinish => "remove_finish",
    }
}

/// Which transition action runs before the status commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Start,
    Update,
    Recover,
    Remove,
    Clear,
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsmTrans {
    pub next: JobStatus,
    pub kind: TransitionKind,
}

/// Look up the transition for a (status, event) pair.
///
/// Returns `None` for conflicting pairs. The mapping is total and
/// deterministic; callers must run the transition action first and only
/// commit `next` when it succeeds.
pub fn transition(status: JobStatus, event: JobEvent) -> Option<FsmTrans> {
    use JobEvent::*;
    use JobStatus::*;
    use TransitionKind as Kind;

    let (next, kind) = match (status, event) {
        (Pending, Fetch) => (Running, Kind::Start),
        (Pending, Update) => (Updating, Kind::Update),
        (Pending, Remove) => (Finished, Kind::Remove),
        (Running, Update) => (Updating, Kind::Update),
        (Running, Remove) => (Destroying, Kind::Remove),
        (Updating, UpdateFinish) => (Running, Kind::Recover),
        (Updating, Remove) => (Destroying, Kind::Remove),
        (Destroying, RemoveFinish) => (Finished, Kind::Clear),
        _ => return None,
    };
    Some(FsmTrans { next, kind })
}

#[cfg(test)]
#[path = "fsm_tests.rs"]
mod tests;
