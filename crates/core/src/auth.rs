// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-workspace admission policy and owner secret.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Workspace-wide policy for who may reach the IDE.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdmissionLevel {
    #[default]
    OwnerOnly,
    Everyone,
}

crate::simple_display! {
    AdmissionLevel {
        OwnerOnly => "owner_only",
        Everyone => "everyone",
    }
}

/// Admission level plus the instance-scoped owner token.
///
/// `Debug` never prints the token.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceAuthentication {
    pub admission: AdmissionLevel,
    pub owner_token: String,
}

impl WorkspaceAuthentication {
    pub fn new(admission: AdmissionLevel, owner_token: impl Into<String>) -> Self {
        Self { admission, owner_token: owner_token.into() }
    }

    pub fn is_everyone(&self) -> bool {
        self.admission == AdmissionLevel::Everyone
    }

    /// Exact byte comparison, constant time over the candidate length.
    pub fn token_matches(&self, candidate: &[u8]) -> bool {
        let expected = self.owner_token.as_bytes();
        if expected.len() != candidate.len() {
            return false;
        }
        expected.iter().zip(candidate).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
    }
}

impl fmt::Debug for WorkspaceAuthentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceAuthentication")
            .field("admission", &self.admission)
            .field("owner_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
