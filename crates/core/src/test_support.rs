// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{AdmissionLevel, PortInfo, PortSpec, PortVisibility, WorkspaceAuthentication};

/// Canonical workspace id used across tests.
pub const WORKSPACE_ID: &str = "a7dcf2f0-6a42-4d4b-9c4e-7f1b2f1f0d3a";
pub const INSTANCE_ID: &str = "77f6b236-3456-4b88-8284-81ca543a9d65";

// ── Proptest strategies ─────────────────────────────────────────────────

pub mod strategies {
    use crate::{PortVisibility, WorkspaceInfo, WorkspacePhase};
    use proptest::prelude::*;

    pub fn arb_phase() -> impl Strategy<Value = WorkspacePhase> {
        prop_oneof![
            Just(WorkspacePhase::Unknown),
            Just(WorkspacePhase::Initializing),
            Just(WorkspacePhase::Running),
            Just(WorkspacePhase::Interrupted),
            Just(WorkspacePhase::Stopping),
            Just(WorkspacePhase::Stopped),
        ]
    }

    pub fn arb_visibility() -> impl Strategy<Value = PortVisibility> {
        prop_oneof![Just(PortVisibility::Private), Just(PortVisibility::Public)]
    }

    /// Workspace infos drawn from small id and port pools so that
    /// instances collide on workspace ids and public ports.
    pub fn arb_workspace_info() -> impl Strategy<Value = WorkspaceInfo> {
        (
            0u8..3,
            0u8..4,
            arb_phase(),
            0u64..10,
            prop::option::of(0u8..4),
            prop::collection::vec((0u8..6, arb_visibility()), 0..3),
        )
            .prop_map(|(ws, inst, phase, started_at_ms, ide_port, ports)| {
                let ide_public_port = ide_port.map(|p| format!("{}", 400 + u16::from(p))).unwrap_or_default();
                WorkspaceInfo::builder()
                    .workspace_id(format!("ws-{ws}"))
                    .instance_id(format!("ws-{ws}-inst-{inst}"))
                    .ide_public_port(ide_public_port)
                    .phase(phase)
                    .started_at_ms(started_at_ms)
                    .ports(
                        ports
                            .into_iter()
                            .map(|(p, vis)| {
                                super::port(3000 + u32::from(p), &format!("{}", 5000 + u16::from(p)), vis)
                            })
                            .collect(),
                    )
                    .build()
            })
    }
}

// ── Factories ───────────────────────────────────────────────────────────

pub fn port(internal: u32, public_port: &str, visibility: PortVisibility) -> PortInfo {
    PortInfo {
        spec: PortSpec {
            port: internal,
            visibility,
            protocol: "http".to_string(),
            target: internal,
            url: format!("https://{internal}-ws.example.com:{public_port}"),
        },
        public_port: public_port.to_string(),
    }
}

pub fn owner_only(token: &str) -> WorkspaceAuthentication {
    WorkspaceAuthentication::new(AdmissionLevel::OwnerOnly, token)
}

pub fn everyone(token: &str) -> WorkspaceAuthentication {
    WorkspaceAuthentication::new(AdmissionLevel::Everyone, token)
}
