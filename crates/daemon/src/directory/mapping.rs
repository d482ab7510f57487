// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator status to directory entry.

use wsp_core::{public_port_of, PortInfo, WorkspaceInfo};
use wsp_wire::WorkspaceStatus;

/// Maps a status message; exposed ports without a parsable URL port are dropped.
pub fn workspace_info(status: &WorkspaceStatus) -> WorkspaceInfo {
    let ports = status
        .spec
        .exposed_ports
        .iter()
        .filter_map(|spec| {
            let port = PortInfo::from_spec(spec.clone());
            if port.is_none() {
                tracing::debug!(
                    instance_id = %status.id,
                    port = spec.port,
                    "dropping exposed port without public port"
                );
            }
            port
        })
        .collect();

    WorkspaceInfo {
        workspace_id: status.metadata.meta_id.clone(),
        instance_id: status.id.clone(),
        url: status.spec.url.clone(),
        ide_image: status.spec.ide_image.web_ref.clone(),
        ide_public_port: public_port_of(&status.spec.url).unwrap_or_default(),
        ports,
        auth: status.auth.clone(),
        phase: status.phase,
        started_at_ms: status.started_at_ms(),
    }
}

#[cfg(test)]
#[path = "mapping_tests.rs"]
mod tests;
