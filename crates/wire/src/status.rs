// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace status as reported by the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wsp_core::{InstanceId, PortSpec, WorkspaceAuthentication, WorkspaceId, WorkspacePhase};

/// Full status of one workspace instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceStatus {
    /// Instance id.
    pub id: InstanceId,
    pub metadata: WorkspaceMetadata,
    #[serde(default)]
    pub spec: WorkspaceSpec,
    #[serde(default)]
    pub phase: WorkspacePhase,
    #[serde(default)]
    pub auth: WorkspaceAuthentication,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceMetadata {
    /// Logical workspace id the instance belongs to.
    pub meta_id: WorkspaceId,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSpec {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub ide_image: IdeImage,
    #[serde(default)]
    pub exposed_ports: Vec<PortSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeImage {
    #[serde(default)]
    pub web_ref: String,
}

impl WorkspaceStatus {
    /// Start time in epoch milliseconds; zero when unknown.
    pub fn started_at_ms(&self) -> u64 {
        self.metadata
            .started_at
            .map(|t| u64::try_from(t.timestamp_millis()).unwrap_or(0))
            .unwrap_or(0)
    }
}
