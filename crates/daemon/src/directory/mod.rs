// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace Directory: in-memory view of running workspaces.
//!
//! Readers take the shared lock for a single lookup only. The updater
//! takes the exclusive lock for one insert, delete or reinit; critical
//! sections are pure map edits.

mod cache;
mod mapping;
mod updater;

pub use mapping::workspace_info;
pub use updater::{Updater, UpdaterState};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;
use wsp_core::{WorkspaceCoords, WorkspaceId, WorkspaceInfo};

use cache::{Cache, Insert};

#[derive(Debug, Default)]
pub struct Directory {
    cache: RwLock<Cache>,
    ready: AtomicBool,
    changed: Notify,
    access: Mutex<HashMap<WorkspaceId, usize>>,
}

impl Directory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lookup(&self, workspace_id: &str) -> Option<WorkspaceInfo> {
        self.cache.read().get(workspace_id).cloned()
    }

    pub fn lookup_by_public_port(&self, public_port: &str) -> Option<WorkspaceCoords> {
        self.cache.read().coords(public_port).cloned()
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies one status update. Returns false when a fresher instance is kept.
    pub fn insert(&self, info: WorkspaceInfo) -> bool {
        let (workspace_id, instance_id, phase) =
            (info.workspace_id.clone(), info.instance_id.clone(), info.phase);
        let outcome = self.cache.write().insert(info);
        self.changed.notify_waiters();
        match outcome {
            Insert::Ignored => {
                tracing::debug!(
                    %workspace_id,
                    instance_id = instance_id.short(8),
                    %phase,
                    "ignoring stale workspace status"
                );
                false
            }
            Insert::Added | Insert::Replaced => true,
        }
    }

    /// Removes the workspace if `instance_id` is its active instance.
    pub fn delete(&self, workspace_id: &str, instance_id: &str) -> bool {
        let removed = self.cache.write().delete(workspace_id, instance_id);
        if removed {
            let instance_id = wsp_core::short(instance_id, 8);
            tracing::debug!(workspace_id, instance_id, "removed workspace");
        }
        removed
    }

    /// Replaces the whole directory with a fresh snapshot.
    pub fn reinit(&self, infos: Vec<WorkspaceInfo>) {
        let fresh = Cache::from_infos(infos);
        let count = fresh.len();
        *self.cache.write() = fresh;
        self.changed.notify_waiters();
        tracing::info!(workspaces = count, "directory resynchronised");
    }

    /// True once a full sync completed and the stream is connected.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub(crate) fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    /// Looks up a workspace, waiting up to `timeout` for it to appear.
    pub async fn wait_for(&self, workspace_id: &str, timeout: Duration) -> Option<WorkspaceInfo> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(info) = self.lookup(workspace_id) {
                return Some(info);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return None;
            }
        }
    }

    /// Records anonymous access to a public workspace or port until the guard drops.
    pub fn acquire_access(self: &Arc<Self>, coords: &WorkspaceCoords) -> AccessGuard {
        *self.access.lock().entry(coords.id.clone()).or_insert(0) += 1;
        AccessGuard { directory: Arc::clone(self), coords: coords.clone() }
    }

    /// Number of live anonymous access guards for a workspace.
    pub fn access_count(&self, workspace_id: &str) -> usize {
        self.access.lock().get(workspace_id).copied().unwrap_or(0)
    }

    fn release_access(&self, workspace_id: &WorkspaceId) {
        let mut access = self.access.lock();
        if let Some(count) = access.get_mut(workspace_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                access.remove(workspace_id);
            }
        }
    }
}

/// Reference-counted anonymous access context; released on drop.
#[derive(Debug)]
pub struct AccessGuard {
    directory: Arc<Directory>,
    coords: WorkspaceCoords,
}

impl AccessGuard {
    pub fn coords(&self) -> &WorkspaceCoords {
        &self.coords
    }
}

impl Drop for AccessGuard {
    fn drop(&mut self) {
        self.directory.release_access(&self.coords.id);
    }
}

#[cfg(test)]
#[path = "directory_tests.rs"]
mod tests;
