// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator protocol messages.
//!
//! The orchestrator exposes a JSON snapshot endpoint returning
//! [`GetWorkspacesResponse`] and a WebSocket stream of [`SubscribeEvent`]s,
//! one JSON document per text frame.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod event;
mod status;

pub use event::{decode, encode, GetWorkspacesResponse, LogMessage, ProtocolError, SubscribeEvent};
pub use status::{IdeImage, WorkspaceMetadata, WorkspaceSpec, WorkspaceStatus};
