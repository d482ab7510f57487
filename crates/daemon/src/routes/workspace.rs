// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IDE and supervisor routes of a workspace host.

use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::{from_fn_with_state, map_request};
use axum::Router;
use http::uri::PathAndQuery;
use http::Uri;
use tower_http::cors::CorsLayer;
use wsp_core::WorkspaceInfo;

use super::blobserve::{BlobserveTransport, ImageSource};
use super::must_exist::workspace_must_exist;
use super::targets::{self, WorkspaceStarting};
use super::{call, PathPattern, RouteContext, RouteError, RouteTable};
use crate::auth::require_owner;
use crate::config::BlobServerConfig;
use crate::proxy::{is_websocket_upgrade, Fallback};

const SUPERVISOR_FRONTEND: &str = "/_supervisor/frontend";
const FAVICON: &str = "/_supervisor/frontend/favicon.ico";

const DIRECT_IDE: &[PathPattern] = &[
    PathPattern::Exact("/services"),
    PathPattern::Exact("/file-upload"),
    PathPattern::Prefix("/mini-browser"),
    PathPattern::Prefix("/file"),
    PathPattern::Prefix("/files"),
    PathPattern::Prefix("/hostedPlugin"),
    PathPattern::Prefix("/webview"),
];

pub(super) fn table(ctx: &RouteContext) -> Result<RouteTable, RouteError> {
    let routes = WorkspaceRoutes::new(ctx)?;
    let frontend = routes.supervisor_frontend();

    let mut table = RouteTable::new().route(
        "favicon",
        PathPattern::Exact("/favicon.ico"),
        frontend.clone().layer(map_request(|req: Request| async move { with_path(req, FAVICON) })),
    );
    let direct_ide = routes.direct_ide();
    for pattern in DIRECT_IDE {
        table = table.route("direct-ide", *pattern, direct_ide.clone());
    }
    Ok(table
        .route("supervisor-frontend", PathPattern::Prefix(SUPERVISOR_FRONTEND), frontend)
        .route(
            "supervisor-status",
            PathPattern::Prefix("/_supervisor/v1/status/supervisor"),
            routes.supervisor(false),
        )
        .route(
            "supervisor-status",
            PathPattern::Prefix("/_supervisor/v1/status/ide"),
            routes.supervisor(false),
        )
        .route("supervisor-api", PathPattern::Prefix("/_supervisor/v1"), routes.supervisor(true))
        .route("supervisor", PathPattern::Prefix("/_supervisor"), routes.supervisor(true))
        .route("root", PathPattern::Any, routes.root()))
}

struct WorkspaceRoutes<'a> {
    ctx: &'a RouteContext,
    cors: CorsLayer,
}

impl<'a> WorkspaceRoutes<'a> {
    fn new(ctx: &'a RouteContext) -> Result<Self, RouteError> {
        Ok(Self { ctx, cors: ctx.cors()? })
    }

    fn with_auth(&self, router: Router) -> Router {
        router.layer(from_fn_with_state(self.ctx.auth_state(), require_owner))
    }

    fn with_must_exist(&self, router: Router) -> Router {
        router.layer(from_fn_with_state(self.ctx.must_exist_state(), workspace_must_exist))
    }

    /// The IDE port, without any middleware.
    fn ide_pod(&self) -> Router {
        self.ctx
            .pass(targets::ide(self.ctx.pod.clone()))
            .with_error_handler(WorkspaceStarting::new(self.ctx.installation.clone()))
            .into_router()
    }

    /// CORS, then auth, then must-exist.
    fn direct_ide(&self) -> Router {
        let router = self.with_must_exist(self.ide_pod());
        self.with_auth(router).layer(self.cors.clone())
    }

    /// CORS, then must-exist, then auth when `authenticated`.
    fn supervisor(&self, authenticated: bool) -> Router {
        let mut router = self.ctx.pass(targets::supervisor(self.ctx.pod.clone())).into_router();
        if authenticated {
            router = self.with_auth(router);
        }
        self.with_must_exist(router).layer(self.cors.clone())
    }

    fn supervisor_frontend(&self) -> Router {
        let Some(blob) = self.ctx.blob.clone() else {
            return self.supervisor(false);
        };
        let image: Arc<str> = Arc::from(self.ctx.pod.supervisor_image.as_str());
        let transport = self.blobserve(blob.clone(), ImageSource::Supervisor(image.clone()));
        let router = self
            .ctx
            .pass_via(Arc::new(transport), targets::supervisor_assets(blob, image))
            .without_websocket()
            .into_router()
            .layer(map_request(|req: Request| async move {
                let path = req.uri().path();
                let stripped = path.strip_prefix(SUPERVISOR_FRONTEND).unwrap_or(path).to_string();
                with_path(req, &stripped)
            }));
        self.with_must_exist(router)
    }

    /// Static IDE assets first, the authenticated pod when they fail.
    fn root(&self) -> Router {
        let pod = self.with_auth(self.ide_pod());
        let Some(blob) = self.ctx.blob.clone() else {
            return self.with_must_exist(pod).layer(self.cors.clone());
        };

        let supervisor_image = Arc::from(self.ctx.pod.supervisor_image.as_str());
        let transport = self.blobserve(blob.clone(), ImageSource::Ide { supervisor_image });
        let assets = self
            .ctx
            .pass_via(Arc::new(transport), targets::ide_assets(blob))
            .without_websocket()
            .with_error_handler(Fallback(pod.clone()))
            .into_router();

        let router = Router::new().fallback(move |req: Request| {
            let (assets, pod) = (assets.clone(), pod.clone());
            async move {
                let has_image =
                    req.extensions().get::<WorkspaceInfo>().is_some_and(|info| !info.ide_image.is_empty());
                if has_image && !is_websocket_upgrade(req.headers()) {
                    call(&assets, req).await
                } else {
                    call(&pod, req).await
                }
            }
        });
        self.with_must_exist(router).layer(self.cors.clone())
    }

    fn blobserve(&self, blob: Arc<BlobServerConfig>, images: ImageSource) -> BlobserveTransport {
        BlobserveTransport::new(self.ctx.transport.clone(), self.ctx.installation.clone(), blob, images)
    }
}

fn with_path(mut req: Request, path: &str) -> Request {
    let path_and_query = match req.uri().query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    let mut parts = req.uri().clone().into_parts();
    parts.path_and_query = PathAndQuery::try_from(path_and_query).ok();
    if let Ok(uri) = Uri::from_parts(parts) {
        *req.uri_mut() = uri;
    }
    req
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
