// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routes for user-exposed workspace ports.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::middleware::{from_fn, from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use http::header::{CONTENT_TYPE, HOST, X_FRAME_OPTIONS};
use http::{HeaderName, HeaderValue, StatusCode};

use super::targets;
use super::{RouteContext, RouteError};
use crate::auth::require_owner;
use crate::config::GitpodInstallation;
use crate::proxy::cookies::strip_sensitive_cookies;
use crate::proxy::{ErrorHandler, ProxyError};

pub const PORT_NOT_FOUND_PAGE: &str = "port-not-found.html";
const PAGE_ORIGIN: &str = "https://gitpod.io";

const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Serves the builtin port-not-found page as `404`.
#[derive(Debug, Clone)]
pub struct PortNotFoundPage {
    page: Bytes,
}

impl PortNotFoundPage {
    /// Reads the page from `location`, pointing its links at the installation.
    pub fn load(location: &Path, installation: &GitpodInstallation) -> Result<Self, RouteError> {
        let path = location.join(PORT_NOT_FOUND_PAGE);
        let raw = std::fs::read_to_string(&path).map_err(|source| RouteError::Page { path, source })?;
        Ok(Self { page: Bytes::from(raw.replace(PAGE_ORIGIN, &installation.origin())) })
    }

    pub fn response(&self) -> Response {
        (
            StatusCode::NOT_FOUND,
            [(CONTENT_TYPE, "text/html; charset=utf-8")],
            Body::from(self.page.clone()),
        )
            .into_response()
    }
}

#[async_trait]
impl ErrorHandler for PortNotFoundPage {
    async fn handle(&self, req: Request, err: ProxyError) -> Response {
        tracing::debug!(uri = %req.uri(), cause = %err.class(), error = %err, "exposed port unavailable");
        self.response()
    }
}

async fn strip_cookies(State(host_name): State<Arc<str>>, mut req: Request, next: Next) -> Response {
    strip_sensitive_cookies(req.headers_mut(), &host_name);
    next.run(req).await
}

async fn forwarded_headers(mut req: Request, next: Next) -> Response {
    let host = req.headers().get(HOST).and_then(|v| v.to_str().ok()).unwrap_or_default();
    let forwarded_host = HeaderValue::from_str(&format!("{host}:443")).ok();

    let headers = req.headers_mut();
    headers.append(X_FORWARDED_PROTO, HeaderValue::from_static("https"));
    if let Some(value) = forwarded_host {
        headers.append(X_FORWARDED_HOST, value);
    }
    next.run(req).await
}

fn drop_frame_options(resp: &mut Response) {
    resp.headers_mut().remove(X_FRAME_OPTIONS);
}

/// Auth, then cookie filtering, then forwarding headers, then the port.
pub(super) fn routes(ctx: &RouteContext) -> Result<Router, RouteError> {
    let not_found = PortNotFoundPage::load(&ctx.config.proxy.builtin_pages.location, &ctx.installation)?;
    let host_name: Arc<str> = Arc::from(ctx.installation.host_name.as_str());

    Ok(ctx
        .pass(targets::exposed_port(ctx.pod.clone()))
        .with_error_handler(not_found)
        .with_response_handler(drop_frame_options)
        .into_router()
        .layer(from_fn(forwarded_headers))
        .layer(from_fn_with_state(host_name, strip_cookies))
        .layer(from_fn_with_state(ctx.auth_state(), require_owner)))
}

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;
