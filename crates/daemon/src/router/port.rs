// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port-based addressing: the destination port of the request selects the
//! workspace through the public-port index.

use http::uri::Authority;
use http::StatusCode;
use wsp_core::WorkspaceCoords;

use crate::directory::Directory;

/// Resolves `host:port`. A missing or malformed port is 502, an unknown one 404.
pub fn resolve_port(host: Option<&str>, directory: &Directory) -> Result<WorkspaceCoords, StatusCode> {
    let port = host
        .and_then(|host| host.parse::<Authority>().ok())
        .and_then(|authority| authority.port_u16())
        .ok_or(StatusCode::BAD_GATEWAY)?;
    directory.lookup_by_public_port(&port.to_string()).ok_or(StatusCode::NOT_FOUND)
}

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;
