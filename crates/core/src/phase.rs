// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace instance phases and the liveness ordering derived from them.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of one workspace instance as reported by the orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkspacePhase {
    #[default]
    Unknown,
    Initializing,
    Running,
    Interrupted,
    Stopping,
    Stopped,
}

crate::simple_display! {
    WorkspacePhase {
        Unknown => "unknown",
        Initializing => "initializing",
        Running => "running",
        Interrupted => "interrupted",
        Stopping => "stopping",
        Stopped => "stopped",
    }
}

/// Coarse liveness class. Ordered so that a greater class supersedes a lesser one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Liveness {
    Terminating,
    Pending,
    Running,
}

impl WorkspacePhase {
    pub fn liveness(self) -> Liveness {
        match self {
            WorkspacePhase::Running => Liveness::Running,
            WorkspacePhase::Initializing
            | WorkspacePhase::Unknown
            | WorkspacePhase::Interrupted => Liveness::Pending,
            WorkspacePhase::Stopping | WorkspacePhase::Stopped => Liveness::Terminating,
        }
    }

    /// The instance is gone and its directory entry should be removed.
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkspacePhase::Stopped)
    }
}

#[cfg(test)]
#[path = "phase_tests.rs"]
mod tests;
