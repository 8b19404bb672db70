// SPDX-License-Identifier: MIT

//! ovd: the Overseer master daemon.
//!
//! Wires the job manager, the in-process scheduler, and the removal-request
//! bridge between them, then runs until interrupted. The RPC listener and
//! the real metadata store client are deployment concerns layered on top;
//! this binary runs the core against the in-memory store.

use ov_core::{MasterConfig, SystemClock};
use ov_master::{JobManager, ResmanHandle, ResmanRequest};
use ov_sched::{GroupId, Scheduler};
use ov_store::MemStore;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::var("OV_CONFIG") {
        Ok(path) => match MasterConfig::from_toml(Path::new(&path)) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!(%err, path = %path, "failed to load config");
                std::process::exit(2);
            }
        },
        Err(_) => MasterConfig::default(),
    };

    let shutdown = CancellationToken::new();
    let scheduler = Arc::new(Scheduler::new());
    scheduler.start(config.sched_interval, shutdown.clone());

    let (resman, mut resman_rx) = ResmanHandle::channel(64, config.resman_timeout);

    // Bridge master-plane removal requests onto the scheduler.
    {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move {
            while let Some(request) = resman_rx.recv().await {
                match request {
                    ResmanRequest::RemoveContainerGroup { group, reply, .. } => {
                        scheduler.kill(&GroupId::from(group.as_str()));
                        let _ = reply.send(true);
                    }
                }
            }
        });
    }

    let store = Arc::new(MemStore::new());
    let manager = JobManager::new(store, resman, config, SystemClock);
    match manager.reload().await {
        Ok(count) => tracing::info!(jobs = count, "job records reloaded"),
        Err(err) => tracing::error!(%err, "failed to reload job records"),
    }

    tracing::info!("overseer master running");
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutting down");
    manager.stop();
    shutdown.cancel();
}
