// SPDX-License-Identifier: MIT

//! Job record persistence: key layout, codec, and boot-time reload.

use crate::{MetaStore, StoreError};
use ov_core::{Job, JobId};
use std::sync::Arc;

/// Serializes job records into a [`MetaStore`] under
/// `<root><path>/<job_id>`.
///
/// Writes are best-effort from the manager's point of view: a failed write
/// leaves the in-memory state ahead of the store, and the next successful
/// write on a later transition reconverges.
pub struct JobStore<S> {
    store: Arc<S>,
    prefix: String,
}

impl<S: MetaStore> JobStore<S> {
    /// `prefix` is `<nexus_root><jobs_store_path>`, without the trailing
    /// separator.
    pub fn new(store: Arc<S>, prefix: impl Into<String>) -> Self {
        Self { store, prefix: prefix.into() }
    }

    fn key(&self, id: &JobId) -> String {
        format!("{}/{}", self.prefix, id)
    }

    /// Persist the full job record.
    pub async fn save(&self, job: &Job) -> Result<(), StoreError> {
        let value = serde_json::to_string(job)?;
        self.store.put(&self.key(&job.id), value).await
    }

    /// Delete the record for a cleared job.
    pub async fn remove(&self, id: &JobId) -> Result<(), StoreError> {
        self.store.delete(&self.key(id)).await
    }

    /// Enumerate and decode every stored job record.
    ///
    /// Records that no longer decode are skipped with a warning so one bad
    /// entry cannot wedge the whole boot.
    pub async fn load_all(&self) -> Result<Vec<Job>, StoreError> {
        let entries = self.store.list(&format!("{}/", self.prefix)).await?;
        let mut jobs = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match serde_json::from_str::<Job>(&value) {
                Ok(job) => jobs.push(job),
                Err(err) => {
                    tracing::warn!(%key, %err, "skipping undecodable job record");
                }
            }
        }
        Ok(jobs)
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
