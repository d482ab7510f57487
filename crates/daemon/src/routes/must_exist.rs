// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redirects requests for unknown workspaces to the start page.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::header::LOCATION;
use http::StatusCode;
use wsp_core::{WorkspaceCoords, WorkspaceInfo};

use crate::config::GitpodInstallation;
use crate::directory::Directory;

#[derive(Debug, Clone)]
pub struct MustExistState {
    pub directory: Arc<Directory>,
    pub installation: Arc<GitpodInstallation>,
    /// Wait this long for an unknown workspace to appear before redirecting.
    pub wait: Option<Duration>,
}

impl MustExistState {
    async fn find(&self, workspace_id: &str) -> Option<WorkspaceInfo> {
        match self.wait {
            Some(wait) => self.directory.wait_for(workspace_id, wait).await,
            None => self.directory.lookup(workspace_id),
        }
    }
}

pub fn start_page_url(installation: &GitpodInstallation, workspace_id: &str) -> String {
    format!("{}/start/?not_found=true#{workspace_id}", installation.origin())
}

/// Stores the workspace's [`WorkspaceInfo`] in the request extensions, or
/// answers `302 Found` to the start page.
pub async fn workspace_must_exist(
    State(state): State<MustExistState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(coords) = req.extensions().get::<WorkspaceCoords>().cloned() else {
        tracing::error!(uri = %req.uri(), "workspace route without workspace coordinates");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    match state.find(coords.id.as_str()).await {
        Some(info) => {
            req.extensions_mut().insert(info);
            next.run(req).await
        }
        None => {
            tracing::info!(workspace_id = %coords.id, "no workspace info found, redirecting to start");
            let location = start_page_url(&state.installation, coords.id.as_str());
            (StatusCode::FOUND, [(LOCATION, location)]).into_response()
        }
    }
}

#[cfg(test)]
#[path = "must_exist_tests.rs"]
mod tests;
