// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator client: the authoritative source of workspace status.

mod remote;

#[cfg(any(test, feature = "test-support"))]
mod fake;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{EventSender, FakeOrchestrator};
pub use remote::RemoteOrchestrator;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;
use wsp_wire::{ProtocolError, SubscribeEvent, WorkspaceStatus};

/// Stream of subscription events; ends when the orchestrator closes it.
pub type EventStream = BoxStream<'static, Result<SubscribeEvent, OrchestratorError>>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("cannot connect to orchestrator: {0}")]
    Connect(String),

    #[error("orchestrator returned HTTP {0}")]
    Status(http::StatusCode),

    #[error("orchestrator call timed out")]
    Timeout,

    #[error("invalid orchestrator message: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("subscription failed: {0}")]
    Stream(String),
}

#[async_trait]
pub trait Orchestrator: Send + Sync + 'static {
    /// Full snapshot of every known workspace instance.
    async fn get_workspaces(&self) -> Result<Vec<WorkspaceStatus>, OrchestratorError>;

    /// Opens the status subscription.
    async fn subscribe(&self) -> Result<EventStream, OrchestratorError>;
}
