// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace access gateway.
//!
//! Routes inbound requests to workspace pods, exposed ports and the
//! static-asset server, using a directory of workspaces kept in sync
//! with the orchestrator.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod auth;
pub mod config;
pub mod directory;
pub mod env;
pub mod health;
pub mod lifecycle;
pub mod metrics;
pub mod orchestrator;
pub mod proxy;
pub mod router;
pub mod routes;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::Config;
pub use directory::Directory;
pub use lifecycle::{startup, startup_with, Daemon, LifecycleError};
