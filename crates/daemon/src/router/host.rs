// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host-based addressing: `<id><suffix>` and `<port>-<id><suffix>`,
//! each optionally prefixed with `webview-`.

use regex::Regex;
use wsp_core::WorkspaceCoords;

const UUID: &str = "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}";

#[derive(Debug, Clone)]
pub struct HostMatcher {
    workspace: Regex,
    port: Regex,
}

impl HostMatcher {
    pub fn new(workspace_host_suffix: &str) -> Result<Self, regex::Error> {
        let suffix = regex::escape(workspace_host_suffix);
        Ok(Self {
            workspace: Regex::new(&format!("^(?:webview-)?(?P<id>{UUID}){suffix}$"))?,
            port: Regex::new(&format!("^(?:webview-)?(?P<port>[0-9]{{1,5}})-(?P<id>{UUID}){suffix}$"))?,
        })
    }

    /// Coordinates of an exposed-port host.
    pub fn match_port(&self, host: &str) -> Option<WorkspaceCoords> {
        let caps = self.port.captures(host)?;
        Some(WorkspaceCoords::port(&caps["id"], &caps["port"]))
    }

    /// Coordinates of a workspace (IDE) host.
    pub fn match_workspace(&self, host: &str) -> Option<WorkspaceCoords> {
        let caps = self.workspace.captures(host)?;
        Some(WorkspaceCoords::workspace(&caps["id"]))
    }

    /// Port pattern first; the two patterns never both match.
    pub fn match_host(&self, host: &str) -> Option<WorkspaceCoords> {
        self.match_port(host).or_else(|| self.match_workspace(host))
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
