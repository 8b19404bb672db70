// SPDX-License-Identifier: MIT

//! The resource-manager sibling, seen from the master as an opaque
//! asynchronous request channel.
//!
//! Requests are fire-and-forget: each one runs in its own task that owns
//! the request and reply buffers, applies the configured timeout, and logs
//! and drops on any failure. No caller ever blocks on the resource manager.

use ov_core::{JobId, Terminator};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Requests the master sends to the resource manager.
pub enum ResmanRequest {
    /// Remove the container group backing a cleared job.
    RemoveContainerGroup {
        group: JobId,
        user: Option<Terminator>,
        reply: oneshot::Sender<bool>,
    },
}

/// Sender half of the resource-manager channel.
///
/// The endpoint sits behind its own mutex so leader failover on the sibling
/// service can be applied without touching the job index. Lock order when
/// both are held: job-manager mutex first.
#[derive(Clone)]
pub struct ResmanHandle {
    endpoint: Arc<Mutex<String>>,
    tx: mpsc::Sender<ResmanRequest>,
    timeout: Duration,
}

impl ResmanHandle {
    pub fn new(tx: mpsc::Sender<ResmanRequest>, timeout: Duration) -> Self {
        Self { endpoint: Arc::new(Mutex::new(String::new())), tx, timeout }
    }

    /// Build a handle plus the receiving end, for wiring and tests.
    pub fn channel(
        capacity: usize,
        timeout: Duration,
    ) -> (Self, mpsc::Receiver<ResmanRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx, timeout), rx)
    }

    pub fn set_endpoint(&self, endpoint: impl Into<String>) {
        *self.endpoint.lock() = endpoint.into();
    }

    pub fn endpoint(&self) -> String {
        self.endpoint.lock().clone()
    }

    /// Ask the resource manager to remove a job's container group.
    ///
    /// Returns immediately; the outcome is only ever logged. Aging retries
    /// nothing here — convergence relies on the surviving state.
    pub fn remove_container_group(&self, group: JobId, user: Option<Terminator>) {
        let tx = self.tx.clone();
        let timeout = self.timeout;
        let endpoint = self.endpoint();
        tokio::spawn(async move {
            let (reply_tx, reply_rx) = oneshot::channel();
            let request = ResmanRequest::RemoveContainerGroup {
                group: group.clone(),
                user,
                reply: reply_tx,
            };
            match tokio::time::timeout(timeout, tx.send(request)).await {
                Ok(Ok(())) => {}
                _ => {
                    tracing::warn!(group = %group, resman = %endpoint, "removal request not accepted");
                    return;
                }
            }
            match tokio::time::timeout(timeout, reply_rx).await {
                Ok(Ok(true)) => {
                    tracing::debug!(group = %group, "container group removal acknowledged");
                }
                Ok(Ok(false)) => {
                    tracing::warn!(group = %group, resman = %endpoint, "container group removal failed");
                }
                Ok(Err(_)) | Err(_) => {
                    tracing::warn!(group = %group, resman = %endpoint, "container group removal dropped");
                }
            }
        });
    }
}

#[cfg(test)]
#[path = "resman_tests.rs"]
mod tests;
