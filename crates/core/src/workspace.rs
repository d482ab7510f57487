// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-in-time view of a running workspace instance.
//!
//! A workspace has a stable [`WorkspaceId`]; every restart gets a fresh
//! [`InstanceId`]. The directory keeps one active [`WorkspaceInfo`] per
//! workspace, chosen with [`WorkspaceInfo::supersedes`].

use crate::auth::WorkspaceAuthentication;
use crate::phase::WorkspacePhase;
use crate::port::PortInfo;

crate::define_id! {
    /// Stable logical workspace identifier, unchanged across restarts.
    pub struct WorkspaceId;
}

crate::define_id! {
    /// Identifier of one running instance of a workspace.
    pub struct InstanceId;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceInfo {
    pub workspace_id: WorkspaceId,
    pub instance_id: InstanceId,
    /// Externally reachable base URL of the instance.
    pub url: String,
    /// Image reference used to locate the IDE's static assets.
    pub ide_image: String,
    /// Public port parsed from `url`; empty when the URL had none.
    pub ide_public_port: String,
    pub ports: Vec<PortInfo>,
    pub auth: WorkspaceAuthentication,
    pub phase: WorkspacePhase,
    pub started_at_ms: u64,
}

crate::builder! {
    pub struct WorkspaceInfoBuilder => WorkspaceInfo {
        into {
            workspace_id: WorkspaceId = "a7dcf2f0-6a42-4d4b-9c4e-7f1b2f1f0d3a",
            instance_id: InstanceId = "c1b9e3f4-1d2e-4f5a-8b6c-9d0e1f2a3b4c",
            url: String = "https://a7dcf2f0-6a42-4d4b-9c4e-7f1b2f1f0d3a.ws.example.com",
            ide_image: String = "eu.gcr.io/gitpod/ide/theia:latest",
            ide_public_port: String = "443",
        }
        set {
            ports: Vec<PortInfo> = Vec::new(),
            auth: WorkspaceAuthentication = WorkspaceAuthentication::default(),
            phase: WorkspacePhase = WorkspacePhase::Running,
            started_at_ms: u64 = 1_000_000,
        }
    }
}

impl WorkspaceInfo {
    /// Exposed port whose internal port number is `port`.
    pub fn exposed_port(&self, port: &str) -> Option<&PortInfo> {
        self.ports.iter().find(|p| p.spec.port.to_string() == port)
    }

    /// Every public port key this instance occupies, IDE port first.
    pub fn public_ports(&self) -> impl Iterator<Item = &str> {
        let ide = (!self.ide_public_port.is_empty()).then_some(self.ide_public_port.as_str());
        ide.into_iter().chain(self.ports.iter().map(|p| p.public_port.as_str()))
    }

    /// Whether `self` should replace `existing` as the active instance.
    ///
    /// Same instance always replaces. Otherwise the higher liveness class
    /// wins, and within one class the newer-or-equal start time wins.
    pub fn supersedes(&self, existing: &WorkspaceInfo) -> bool {
        if self.instance_id == existing.instance_id {
            return true;
        }
        let (incoming, current) = (self.phase.liveness(), existing.phase.liveness());
        if incoming != current {
            return incoming > current;
        }
        self.started_at_ms >= existing.started_at_ms
    }
}

/// Routing target of a request.
///
/// `port` is the internal port number of an exposed port; empty addresses the IDE.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WorkspaceCoords {
    pub id: WorkspaceId,
    pub port: String,
}

impl WorkspaceCoords {
    pub fn workspace(id: impl Into<WorkspaceId>) -> Self {
        Self { id: id.into(), port: String::new() }
    }

    pub fn port(id: impl Into<WorkspaceId>, port: impl Into<String>) -> Self {
        Self { id: id.into(), port: port.into() }
    }

    pub fn is_port(&self) -> bool {
        !self.port.is_empty()
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
