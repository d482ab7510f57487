// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exposed workspace ports.

use serde::{Deserialize, Serialize};

/// Per-port access policy, independent of the workspace admission level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortVisibility {
    #[default]
    Private,
    Public,
}

crate::simple_display! {
    PortVisibility {
        Private => "private",
        Public => "public",
    }
}

/// A port as the orchestrator describes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSpec {
    /// Port inside the workspace.
    pub port: u32,
    #[serde(default)]
    pub visibility: PortVisibility,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub target: u32,
    /// Externally reachable URL for this port.
    pub url: String,
}

/// An exposed port together with the public port key it is reachable on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub spec: PortSpec,
    pub public_port: String,
}

impl PortInfo {
    /// Builds the port entry, or `None` when the URL carries no usable port.
    pub fn from_spec(spec: PortSpec) -> Option<Self> {
        let public_port = public_port_of(&spec.url)?;
        Some(Self { spec, public_port })
    }

    pub fn is_public(&self) -> bool {
        self.spec.visibility == PortVisibility::Public
    }
}

/// Public port of a URL; defaults to 80 for http and 443 for https.
pub fn public_port_of(raw: &str) -> Option<String> {
    let url = url::Url::parse(raw).ok()?;
    if !url.has_host() {
        return None;
    }
    url.port_or_known_default().map(|p| p.to_string())
}

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;
