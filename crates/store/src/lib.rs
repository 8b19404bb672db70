// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ov-store: durable metadata store abstraction.
//!
//! The real store is an external replicated key/value service; the master
//! only needs put/get/delete plus prefix enumeration for boot-time reload.
//! [`MemStore`] implements the same trait in memory for tests and
//! single-process runs.

mod jobs;
mod mem;

use async_trait::async_trait;
use thiserror::Error;

pub use jobs::JobStore;
pub use mem::MemStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable key/value service used for master metadata.
#[async_trait]
pub trait MetaStore: Send + Sync + 'static {
    async fn put(&self, key: &str, value: String) -> Result<(), StoreError>;
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
    /// Enumerate all entries whose key starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError>;
}
