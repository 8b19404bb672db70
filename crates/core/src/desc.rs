// SPDX-License-Identifier: MIT

//! Job descriptions and the rolling-update action computation.
//!
//! A [`JobDescription`] is the declarative unit a client submits: a deploy
//! policy plus the pod specification every replica runs. Updates swap in a
//! new description; [`update_action`] decides what the change means for pods
//! already running the old one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Version assigned to a submitted description that carries none.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// An installable artifact referenced by a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub source: String,
    pub version: String,
}

/// One task inside a pod: an executable package plus its data packages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: String,
    pub exe_package: Package,
    #[serde(default)]
    pub data_packages: Vec<Package>,
}

/// The per-replica specification advertised to workers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSpec {
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

/// Rollout policy for a job.
///
/// `step` caps how many pods may be in a pre-serving state at once;
/// `replica` is the target pod count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployPolicy {
    pub step: u32,
    pub replica: u32,
}

/// A versioned, declarative job submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescription {
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub deploy: DeployPolicy,
    pub pod: PodSpec,
}

/// What pods on the old description must do to pick up an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateAction {
    /// No pod-visible change.
    #[default]
    Null,
    /// Swap data packages in place.
    Reload,
    /// Destroy the container and re-create it from the image.
    Rebuild,
}

crate::simple_display! {
    UpdateAction {
        Null => "null",
        Reload => "reload",
        Rebuild => "rebuild",
    }
}

/// Compute the update action for a description change.
///
/// Tasks are matched by id against an index of the old spec. A changed task
/// count, executable version, or data-package count forces a rebuild; a
/// changed data-package version alone is a reload. Rebuild wins when both
/// occur across different tasks. Tasks whose id has no counterpart in the
/// old spec contribute nothing.
pub fn update_action(old: &PodSpec, new: &PodSpec) -> UpdateAction {
    if new.tasks.len() != old.tasks.len() {
        return UpdateAction::Rebuild;
    }
    let index: HashMap<&str, &TaskSpec> =
        old.tasks.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut action = UpdateAction::Null;
    for task in &new.tasks {
        let Some(prev) = index.get(task.id.as_str()) else {
            continue;
        };
        if task.exe_package.version != prev.exe_package.version
            || task.data_packages.len() != prev.data_packages.len()
        {
            return UpdateAction::Rebuild;
        }
        let data_changed = task
            .data_packages
            .iter()
            .zip(&prev.data_packages)
            .any(|(new_pkg, old_pkg)| new_pkg.version != old_pkg.version);
        if data_changed {
            action = UpdateAction::Reload;
        }
    }
    action
}

#[cfg(test)]
#[path = "desc_tests.rs"]
mod tests;
