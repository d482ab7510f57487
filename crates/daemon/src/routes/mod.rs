// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route table.
//!
//! [`app`] builds the complete inbound router: the coordinate router runs
//! first, then the [`RouteMatch`] it recorded selects the workspace table,
//! the exposed-port routes or the blobserve host. Workspace routes are
//! matched in priority order; the first matching path wins.

pub mod blobserve;
mod must_exist;
mod port;
mod targets;
mod workspace;

pub use must_exist::{start_page_url, workspace_must_exist, MustExistState};
pub use port::{PortNotFoundPage, PORT_NOT_FOUND_PAGE};
pub use targets::WorkspaceStarting;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::Router;
use http::StatusCode;
use thiserror::Error;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

use crate::auth::AuthState;
use crate::config::{BlobServerConfig, Config, GitpodInstallation, WorkspacePodConfig};
use crate::directory::Directory;
use crate::metrics::Metrics;
use crate::proxy::cors::workspace_cors;
use crate::proxy::{ProxyPass, RoundTrip, TargetResolver};
use crate::router::{assign_coordinates, CoordinateRouter, RouteMatch, RouterError};

#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Router(#[from] RouterError),

    #[error("invalid CORS origin pattern: {0}")]
    Cors(#[from] regex::Error),

    #[error("cannot read builtin page {path}: {source}")]
    Page { path: PathBuf, source: std::io::Error },
}

/// Everything a route needs, built once at startup.
#[derive(Clone)]
pub struct RouteContext {
    pub config: Arc<Config>,
    pub directory: Arc<Directory>,
    pub transport: Arc<dyn RoundTrip>,
    pub installation: Arc<GitpodInstallation>,
    pub pod: Arc<WorkspacePodConfig>,
    pub blob: Option<Arc<BlobServerConfig>>,
}

impl RouteContext {
    pub fn new(config: Arc<Config>, directory: Arc<Directory>, transport: Arc<dyn RoundTrip>) -> Self {
        let proxy = &config.proxy;
        Self {
            installation: Arc::new(proxy.gitpod_installation.clone()),
            pod: Arc::new(proxy.workspace_pod_config.clone()),
            blob: proxy.blob_server.clone().map(Arc::new),
            config,
            directory,
            transport,
        }
    }

    /// A pass over the shared pooled transport.
    pub fn pass(&self, resolver: impl TargetResolver + 'static) -> ProxyPass {
        self.pass_via(self.transport.clone(), resolver)
    }

    pub fn pass_via(
        &self,
        transport: Arc<dyn RoundTrip>,
        resolver: impl TargetResolver + 'static,
    ) -> ProxyPass {
        ProxyPass::new(transport, &self.config.proxy.transport_config, resolver)
    }

    pub fn auth_state(&self) -> AuthState {
        AuthState {
            directory: self.directory.clone(),
            host_name: Arc::from(self.installation.host_name.as_str()),
        }
    }

    pub fn must_exist_state(&self) -> MustExistState {
        MustExistState {
            directory: self.directory.clone(),
            installation: self.installation.clone(),
            wait: self.config.workspace_info_wait,
        }
    }

    pub fn cors(&self) -> Result<CorsLayer, RouteError> {
        Ok(workspace_cors(&self.installation)?)
    }
}

/// Path matching with string-prefix semantics: `/file` also matches `/files`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPattern {
    Exact(&'static str),
    Prefix(&'static str),
    Any,
}

impl PathPattern {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(exact) => path == *exact,
            PathPattern::Prefix(prefix) => path.starts_with(prefix),
            PathPattern::Any => true,
        }
    }
}

struct Route {
    name: &'static str,
    pattern: PathPattern,
    service: Router,
}

/// Ordered workspace routes.
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, name: &'static str, pattern: PathPattern, service: Router) -> Self {
        self.routes.push(Route { name, pattern, service });
        self
    }

    /// Name and service of the first route matching `path`.
    pub fn find(&self, path: &str) -> Option<(&'static str, &Router)> {
        self.routes.iter().find(|r| r.pattern.matches(path)).map(|r| (r.name, &r.service))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.routes.iter().map(|r| r.name)
    }
}

const NOT_FOUND: &str = "not-found";

#[derive(Clone)]
struct Gateway {
    workspace: Arc<RouteTable>,
    port: Router,
    blobserve: Option<Router>,
    metrics: Arc<Metrics>,
}

async fn call(service: &Router, req: Request) -> Response {
    match service.clone().oneshot(req).await {
        Ok(resp) => resp,
        Err(never) => match never {},
    }
}

async fn dispatch(State(gateway): State<Gateway>, req: Request) -> Response {
    let started = Instant::now();
    let matched = req.extensions().get::<RouteMatch>().cloned();

    let (handler, resp) = match matched {
        Some(RouteMatch::Workspace(_)) => match gateway.workspace.find(req.uri().path()) {
            Some((name, service)) => (name, call(service, req).await),
            None => (NOT_FOUND, StatusCode::NOT_FOUND.into_response()),
        },
        Some(RouteMatch::Port(_)) => ("port", call(&gateway.port, req).await),
        Some(RouteMatch::Blobserve) => match &gateway.blobserve {
            Some(service) => ("blobserve", call(service, req).await),
            None => (NOT_FOUND, StatusCode::NOT_FOUND.into_response()),
        },
        Some(RouteMatch::Failed(status)) => (NOT_FOUND, status.into_response()),
        None => (NOT_FOUND, StatusCode::NOT_FOUND.into_response()),
    };

    tracing::debug!(handler, status = resp.status().as_u16(), "hit route handler");
    gateway.metrics.record(handler, resp.status(), started.elapsed());
    resp
}

/// The complete inbound router.
pub fn app(ctx: &RouteContext, metrics: Arc<Metrics>) -> Result<Router, RouteError> {
    let coordinates = Arc::new(CoordinateRouter::new(&ctx.config, ctx.directory.clone())?);
    let gateway = Gateway {
        workspace: Arc::new(workspace::table(ctx)?),
        port: port::routes(ctx)?,
        blobserve: ctx.blob.clone().map(|blob| blobserve::routes(ctx, blob)),
        metrics,
    };

    Ok(Router::new()
        .fallback(dispatch)
        .with_state(gateway)
        .layer(from_fn_with_state(coordinates, assign_coordinates)))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
