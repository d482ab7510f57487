// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Target resolvers and error handlers shared by the route table.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::response::{IntoResponse, Response};
use http::header::{ACCEPT, LOCATION};
use http::request::Parts;
use http::{Method, Request, StatusCode};
use url::Url;
use wsp_core::{WorkspaceCoords, WorkspaceInfo};

use crate::config::{BlobServerConfig, GitpodInstallation, WorkspacePodConfig};
use crate::proxy::{ErrorHandler, ProxyError, ResolveError, TargetResolver};

pub fn coords(parts: &Parts) -> Result<&WorkspaceCoords, ResolveError> {
    parts.extensions.get::<WorkspaceCoords>().ok_or(ResolveError::MissingCoords)
}

pub fn info(parts: &Parts) -> Result<&WorkspaceInfo, ResolveError> {
    parts.extensions.get::<WorkspaceInfo>().ok_or_else(|| {
        let id = coords(parts).map(|c| c.id.to_string()).unwrap_or_default();
        ResolveError::MissingWorkspace(id)
    })
}

/// The IDE port of the workspace pod.
pub fn ide(pod: Arc<WorkspacePodConfig>) -> impl TargetResolver {
    move |parts: &Parts| -> Result<Url, ResolveError> {
        Ok(pod.ide_url(coords(parts)?.id.as_str())?)
    }
}

/// The supervisor port of the workspace pod.
pub fn supervisor(pod: Arc<WorkspacePodConfig>) -> impl TargetResolver {
    move |parts: &Parts| -> Result<Url, ResolveError> {
        Ok(pod.supervisor_url(coords(parts)?.id.as_str())?)
    }
}

/// The exposed port addressed by the request.
pub fn exposed_port(pod: Arc<WorkspacePodConfig>) -> impl TargetResolver {
    move |parts: &Parts| -> Result<Url, ResolveError> {
        let coords = coords(parts)?;
        Ok(pod.port_url(coords.id.as_str(), &coords.port)?)
    }
}

/// The IDE image on the static-asset server.
pub fn ide_assets(blob: Arc<BlobServerConfig>) -> impl TargetResolver {
    move |parts: &Parts| -> Result<Url, ResolveError> {
        let image = &info(parts)?.ide_image;
        if image.is_empty() {
            return Err(ResolveError::MissingImage);
        }
        Ok(blob.image_url(image)?)
    }
}

/// The supervisor image on the static-asset server.
pub fn supervisor_assets(blob: Arc<BlobServerConfig>, image: Arc<str>) -> impl TargetResolver {
    move |_: &Parts| -> Result<Url, ResolveError> {
        if image.is_empty() {
            return Err(ResolveError::MissingImage);
        }
        Ok(blob.image_url(&image)?)
    }
}

/// Sends browsers to the start page while a workspace boots; everything else gets 502.
#[derive(Debug, Clone)]
pub struct WorkspaceStarting {
    installation: Arc<GitpodInstallation>,
}

impl WorkspaceStarting {
    pub fn new(installation: Arc<GitpodInstallation>) -> Self {
        Self { installation }
    }

    pub fn start_url(&self, workspace_id: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}/start/#{workspace_id}", self.installation.origin()))
    }
}

fn wants_html(req: &Request<Body>) -> bool {
    req.method() == Method::GET
        && req
            .headers()
            .get(ACCEPT)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|accept| accept.contains("text/html"))
}

#[async_trait]
impl ErrorHandler for WorkspaceStarting {
    async fn handle(&self, req: Request<Body>, err: ProxyError) -> Response {
        let workspace_id = req.extensions().get::<WorkspaceCoords>().map(|c| c.id.to_string());
        tracing::warn!(
            workspace_id = workspace_id.as_deref().unwrap_or(""),
            uri = %req.uri(),
            cause = %err.class(),
            error = %err,
            "workspace backend unavailable"
        );

        match workspace_id {
            Some(id) if wants_html(&req) => match self.start_url(&id) {
                Ok(url) => (StatusCode::FOUND, [(LOCATION, url.to_string())]).into_response(),
                Err(_) => StatusCode::BAD_GATEWAY.into_response(),
            },
            _ => StatusCode::BAD_GATEWAY.into_response(),
        }
    }
}

#[cfg(test)]
#[path = "targets_tests.rs"]
mod tests;
