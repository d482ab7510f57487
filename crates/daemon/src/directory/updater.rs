// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background task keeping the directory in sync with the orchestrator.
//!
//! Connecting → Syncing → Streaming, and BackingOff after any failure or
//! end of stream. Retries forever; failures never reach request handling.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wsp_wire::SubscribeEvent;

use super::{mapping, Directory};
use crate::orchestrator::{EventStream, Orchestrator, OrchestratorError};

/// Bound on the subscribe handshake and on the snapshot fetch.
const CALL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdaterState {
    Connecting,
    Syncing,
    Streaming,
    BackingOff,
    Stopped,
}

wsp_core::simple_display! {
    UpdaterState {
        Connecting => "connecting",
        Syncing => "syncing",
        Streaming => "streaming",
        BackingOff => "backing-off",
        Stopped => "stopped",
    }
}

pub struct Updater {
    orchestrator: Arc<dyn Orchestrator>,
    directory: Arc<Directory>,
    reconnect_interval: Duration,
    state: watch::Sender<UpdaterState>,
}

impl Updater {
    pub fn new(
        orchestrator: Arc<dyn Orchestrator>,
        directory: Arc<Directory>,
        reconnect_interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(UpdaterState::Connecting);
        Self { orchestrator, directory, reconnect_interval, state }
    }

    /// Observe state transitions.
    pub fn state(&self) -> watch::Receiver<UpdaterState> {
        self.state.subscribe()
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, shutdown: CancellationToken) {
        loop {
            let outcome = tokio::select! {
                _ = shutdown.cancelled() => break,
                outcome = self.connect_and_stream() => outcome,
            };
            self.directory.set_ready(false);
            match outcome {
                Ok(()) => tracing::info!("orchestrator stream ended, reconnecting"),
                Err(e) => tracing::warn!(error = %e, "orchestrator connection failed"),
            }

            self.transition(UpdaterState::BackingOff);
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_interval) => {}
            }
        }
        self.directory.set_ready(false);
        self.transition(UpdaterState::Stopped);
    }

    /// One connection epoch. Returns `Ok` on clean end of stream.
    async fn connect_and_stream(&self) -> Result<(), OrchestratorError> {
        self.transition(UpdaterState::Connecting);
        let mut events = bounded(self.orchestrator.subscribe()).await?;

        self.transition(UpdaterState::Syncing);
        let snapshot = bounded(self.orchestrator.get_workspaces()).await?;
        self.directory.reinit(snapshot.iter().map(mapping::workspace_info).collect());
        self.directory.set_ready(true);

        self.transition(UpdaterState::Streaming);
        self.consume(&mut events).await
    }

    async fn consume(&self, events: &mut EventStream) -> Result<(), OrchestratorError> {
        while let Some(event) = events.next().await {
            self.apply(event?);
        }
        Ok(())
    }

    fn apply(&self, event: SubscribeEvent) {
        let Some(status) = event.status else {
            return;
        };
        if status.phase.is_terminal() {
            self.directory.delete(&status.metadata.meta_id, &status.id);
        } else {
            self.directory.insert(mapping::workspace_info(&status));
        }
    }

    fn transition(&self, next: UpdaterState) {
        tracing::debug!(state = %next, "directory updater");
        self.state.send_replace(next);
    }
}

async fn bounded<T>(
    call: impl std::future::Future<Output = Result<T, OrchestratorError>>,
) -> Result<T, OrchestratorError> {
    tokio::time::timeout(CALL_TIMEOUT, call).await.map_err(|_| OrchestratorError::Timeout)?
}

#[cfg(test)]
#[path = "updater_tests.rs"]
mod tests;
