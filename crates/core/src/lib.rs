// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wsp-core: workspace model shared by the gateway crates

pub mod macros;

pub mod auth;
pub mod id;
pub mod phase;
pub mod port;
pub mod workspace;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use auth::{AdmissionLevel, WorkspaceAuthentication};
pub use id::short;
pub use phase::{Liveness, WorkspacePhase};
pub use port::{public_port_of, PortInfo, PortSpec, PortVisibility};
#[cfg(any(test, feature = "test-support"))]
pub use workspace::WorkspaceInfoBuilder;
pub use workspace::{InstanceId, WorkspaceCoords, WorkspaceId, WorkspaceInfo};
