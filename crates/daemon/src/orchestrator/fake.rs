// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory orchestrator for tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use wsp_wire::{SubscribeEvent, WorkspaceStatus};

use super::{EventStream, Orchestrator, OrchestratorError};

pub type EventSender = mpsc::UnboundedSender<Result<SubscribeEvent, OrchestratorError>>;

#[derive(Default)]
struct FakeState {
    snapshot: Vec<WorkspaceStatus>,
    streams: VecDeque<mpsc::UnboundedReceiver<Result<SubscribeEvent, OrchestratorError>>>,
    subscribe_calls: usize,
    fail_snapshot: bool,
}

/// Serves a fixed snapshot and hands out one queued stream per subscription.
/// Subscribing with no queued stream fails as a connect error.
#[derive(Default)]
pub struct FakeOrchestrator {
    state: Mutex<FakeState>,
}

impl FakeOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_snapshot(&self, snapshot: Vec<WorkspaceStatus>) {
        self.state.lock().snapshot = snapshot;
    }

    pub fn fail_snapshot(&self, fail: bool) {
        self.state.lock().fail_snapshot = fail;
    }

    /// Queues a stream for the next `subscribe` call; dropping the sender ends it.
    pub fn push_stream(&self) -> EventSender {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().streams.push_back(rx);
        tx
    }

    pub fn subscribe_calls(&self) -> usize {
        self.state.lock().subscribe_calls
    }
}

#[async_trait]
impl Orchestrator for FakeOrchestrator {
    async fn get_workspaces(&self) -> Result<Vec<WorkspaceStatus>, OrchestratorError> {
        let state = self.state.lock();
        if state.fail_snapshot {
            return Err(OrchestratorError::Status(http::StatusCode::SERVICE_UNAVAILABLE));
        }
        Ok(state.snapshot.clone())
    }

    async fn subscribe(&self) -> Result<EventStream, OrchestratorError> {
        let mut state = self.state.lock();
        state.subscribe_calls += 1;
        let rx = state
            .streams
            .pop_front()
            .ok_or_else(|| OrchestratorError::Connect("no stream queued".to_string()))?;
        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(stream.boxed())
    }
}
