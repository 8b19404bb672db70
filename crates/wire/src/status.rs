// SPDX-License-Identifier: MIT

//! Externally observable result codes.

use ov_core::FetchAction;
use serde::{Deserialize, Serialize};

/// Result code carried on every response.
///
/// `Ok`/`Reload`/`Rebuild`/`Deny`/`Terminate` double as worker action codes
/// on fetch responses; the rest report call failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    JobNotFound,
    StatusConflict,
    Deny,
    Terminate,
    Reload,
    Rebuild,
    Error,
}

ov_core::simple_display! {
    Status {
        Ok => "ok",
        JobNotFound => "job_not_found",
        StatusConflict => "status_conflict",
        Deny => "deny",
        Terminate => "terminate",
        Reload => "reload",
        Rebuild => "rebuild",
        Error => "error",
    }
}

impl From<FetchAction> for Status {
    fn from(action: FetchAction) -> Self {
        match action {
            FetchAction::Ok => Status::Ok,
            FetchAction::Reload => Status::Reload,
            FetchAction::Rebuild => Status::Rebuild,
            FetchAction::Deny => Status::Deny,
            FetchAction::Terminate => Status::Terminate,
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
