// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinate router.
//!
//! Runs before any route handler and records a [`RouteMatch`] (plus the
//! [`WorkspaceCoords`] it carries) in the request extensions. Routing never
//! writes a response; failures are stored for the not-found handler.

mod host;
mod path;
mod port;

pub use host::HostMatcher;
pub use path::{PathMatch, PathMatcher};
pub use port::resolve_port;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http::header::HOST;
use http::request::Parts;
use http::{HeaderName, StatusCode, Uri};
use thiserror::Error;
use wsp_core::WorkspaceCoords;

use crate::config::{Config, RoutingStrategy};
use crate::directory::Directory;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("invalid host pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid host header name {0:?}")]
    HostHeader(String),
}

/// What the router decided for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    /// IDE, supervisor and other workspace routes.
    Workspace(WorkspaceCoords),
    /// A user-exposed port.
    Port(WorkspaceCoords),
    /// The static-asset host.
    Blobserve,
    /// Routing failed; the not-found handler answers with this status.
    Failed(StatusCode),
}

impl RouteMatch {
    pub fn coords(&self) -> Option<&WorkspaceCoords> {
        match self {
            RouteMatch::Workspace(coords) | RouteMatch::Port(coords) => Some(coords),
            RouteMatch::Blobserve | RouteMatch::Failed(_) => None,
        }
    }

    fn from_coords(coords: WorkspaceCoords) -> Self {
        if coords.is_port() {
            RouteMatch::Port(coords)
        } else {
            RouteMatch::Workspace(coords)
        }
    }
}

#[derive(Debug)]
pub struct CoordinateRouter {
    strategy: RoutingStrategy,
    host_header: HeaderName,
    blobserve_host: String,
    hosts: HostMatcher,
    paths: PathMatcher,
    directory: Arc<Directory>,
}

impl CoordinateRouter {
    pub fn new(config: &Config, directory: Arc<Directory>) -> Result<Self, RouterError> {
        let routing = &config.routing;
        let installation = &config.proxy.gitpod_installation;
        let host_header = HeaderName::from_bytes(routing.host_header.to_ascii_lowercase().as_bytes())
            .map_err(|_| RouterError::HostHeader(routing.host_header.clone()))?;
        Ok(Self {
            strategy: routing.strategy,
            host_header,
            blobserve_host: installation.blobserve_host(),
            hosts: HostMatcher::new(&installation.workspace_host_suffix)?,
            paths: PathMatcher::new(&routing.path_prefix),
            directory,
        })
    }

    /// Host used for host-based matching, without its port.
    fn routing_host(&self, parts: &Parts) -> Option<String> {
        let raw = parts
            .headers
            .get(&self.host_header)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .or_else(|| destination_host(parts))?;
        Some(strip_port(raw).to_ascii_lowercase())
    }

    /// Decides the route and rewrites the URI when the path carried the workspace id.
    pub fn route(&self, parts: &mut Parts) -> Option<RouteMatch> {
        let host = self.routing_host(parts);
        if host.as_deref() == Some(self.blobserve_host.as_str()) {
            return Some(RouteMatch::Blobserve);
        }

        match self.strategy {
            RoutingStrategy::Host => {
                let coords = self.hosts.match_host(host.as_deref()?)?;
                Some(RouteMatch::from_coords(coords))
            }
            RoutingStrategy::PathAndHost => {
                if let Some(coords) = host.as_deref().and_then(|h| self.hosts.match_port(h)) {
                    return Some(RouteMatch::Port(coords));
                }
                self.route_path(parts)
            }
            RoutingStrategy::PathAndPort => {
                if let Some(matched) = self.route_path(parts) {
                    return Some(matched);
                }
                Some(match resolve_port(destination_host(parts), &self.directory) {
                    Ok(coords) => RouteMatch::from_coords(coords),
                    Err(status) => RouteMatch::Failed(status),
                })
            }
        }
    }

    fn route_path(&self, parts: &mut Parts) -> Option<RouteMatch> {
        let matched = self.paths.match_path(parts.uri.path(), &self.directory)?;
        parts.uri = with_path(&parts.uri, &matched.rest)?;
        Some(RouteMatch::Workspace(WorkspaceCoords::workspace(matched.workspace_id)))
    }
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

fn destination_host(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
}

fn with_path(uri: &Uri, path: &str) -> Option<Uri> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    let mut builder = Uri::builder().path_and_query(path_and_query);
    if let Some(scheme) = uri.scheme() {
        builder = builder.scheme(scheme.clone());
    }
    if let Some(authority) = uri.authority() {
        builder = builder.authority(authority.clone());
    }
    builder.build().ok()
}

/// Middleware recording the route decision in the request extensions.
pub async fn assign_coordinates(
    State(router): State<Arc<CoordinateRouter>>,
    req: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();
    if let Some(matched) = router.route(&mut parts) {
        if let Some(coords) = matched.coords() {
            parts.extensions.insert(coords.clone());
        }
        parts.extensions.insert(matched);
    }
    next.run(Request::from_parts(parts, body)).await
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
