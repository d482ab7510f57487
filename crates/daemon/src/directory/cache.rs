// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two directory indices. Pure data structure, no locking or I/O.

use std::collections::HashMap;

use wsp_core::{WorkspaceCoords, WorkspaceId, WorkspaceInfo};

#[derive(Debug, Default)]
pub(crate) struct Cache {
    by_id: HashMap<WorkspaceId, WorkspaceInfo>,
    by_port: HashMap<String, WorkspaceCoords>,
}

/// Outcome of an insert, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Insert {
    Added,
    Replaced,
    Ignored,
}

impl Cache {
    pub(crate) fn from_infos(infos: impl IntoIterator<Item = WorkspaceInfo>) -> Self {
        let mut cache = Self::default();
        for info in infos {
            cache.insert(info);
        }
        cache
    }

    pub(crate) fn get(&self, id: &str) -> Option<&WorkspaceInfo> {
        self.by_id.get(id)
    }

    pub(crate) fn coords(&self, public_port: &str) -> Option<&WorkspaceCoords> {
        self.by_port.get(public_port)
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    pub(crate) fn insert(&mut self, info: WorkspaceInfo) -> Insert {
        let outcome = match self.by_id.get(&info.workspace_id) {
            None => Insert::Added,
            Some(existing) if info.supersedes(existing) => Insert::Replaced,
            Some(_) => return Insert::Ignored,
        };

        if let Some(previous) = self.by_id.remove(&info.workspace_id) {
            self.unindex(&previous);
        }
        self.index(&info);
        self.by_id.insert(info.workspace_id.clone(), info);
        outcome
    }

    /// Removes the entry only when `instance_id` is the stored instance.
    pub(crate) fn delete(&mut self, workspace_id: &str, instance_id: &str) -> bool {
        let matches = self.by_id.get(workspace_id).is_some_and(|i| i.instance_id == instance_id);
        if !matches {
            return false;
        }
        if let Some(previous) = self.by_id.remove(workspace_id) {
            self.unindex(&previous);
        }
        true
    }

    fn index(&mut self, info: &WorkspaceInfo) {
        if !info.ide_public_port.is_empty() {
            self.by_port.insert(
                info.ide_public_port.clone(),
                WorkspaceCoords::workspace(info.workspace_id.clone()),
            );
        }
        for port in &info.ports {
            self.by_port.insert(
                port.public_port.clone(),
                WorkspaceCoords::port(info.workspace_id.clone(), port.spec.port.to_string()),
            );
        }
    }

    /// Drops the index entries of `info` that still point at its workspace.
    /// Keys since taken over by another workspace are left alone.
    fn unindex(&mut self, info: &WorkspaceInfo) {
        for key in info.public_ports() {
            if self.by_port.get(key).is_some_and(|c| c.id == info.workspace_id) {
                self.by_port.remove(key);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn port_keys(&self) -> impl Iterator<Item = (&String, &WorkspaceCoords)> {
        self.by_port.iter()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
