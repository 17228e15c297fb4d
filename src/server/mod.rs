// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bell experiment server.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            REST (8090) /api/v1/*         │
//! ├─────────────────────────────────────────┤
//! │     Dispatcher (operation table)         │
//! ├──────────────────┬──────────────────────┤
//! │    Experiment    │     Rig registry     │
//! └──────────────────┴──────────────────────┘
//! ```

pub mod rest;

pub use rest::RestServer;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::protocol::Dispatcher;

/// Shared state for the server.
pub struct ServerState {
    pub dispatcher: Arc<Dispatcher>,

    /// Limit on a single operation
    pub timeout: Duration,

    /// Delay between a Kill request and shutdown
    pub kill_delay: Duration,

    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ServerState {
    pub fn new(dispatcher: Arc<Dispatcher>, config: &ServerConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            dispatcher,
            timeout: Duration::from_secs(config.timeout_sec),
            kill_delay: Duration::from_millis(config.kill_delay_ms),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Get a shutdown receiver.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Signal shutdown after the kill delay.
    pub fn schedule_shutdown(self: &Arc<Self>) {
        let state = Arc::clone(self);
        let delay = self.kill_delay;
        warn!(delay_ms = delay.as_millis() as u64, "Shutdown scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            state.shutdown();
        });
    }
}

/// Run the REST server until ctrl-c or a Kill request.
pub async fn run_server(config: &ServerConfig, dispatcher: Arc<Dispatcher>) -> Result<()> {
    let state = Arc::new(ServerState::new(dispatcher, config));

    info!(
        host = %config.host,
        port = config.port,
        kill_delay_ms = config.kill_delay_ms,
        "Starting Bell server"
    );

    let state_for_signal = state.clone();
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            info!("Received shutdown signal, initiating graceful shutdown");
            state_for_signal.shutdown();
        }
    });

    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_sec);
    let mut shutdown_rx = state.shutdown_receiver();
    let server = RestServer::new(state.clone()).serve(config);
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => return result,
        _ = shutdown_rx.changed() => {}
    }

    info!(timeout_secs = config.shutdown_timeout_sec, "Waiting for shutdown to complete");
    match tokio::time::timeout(shutdown_timeout, server).await {
        Ok(result) => result,
        Err(_) => {
            error!("Graceful shutdown timed out");
            Ok(())
        }
    }
}
