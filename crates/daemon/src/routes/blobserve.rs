// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static-asset server integration.
//!
//! [`BlobserveTransport`] wraps the pooled transport for routes that serve
//! IDE or supervisor assets: it waits out image pulls, turns error statuses
//! into transport errors, and redirects cacheable subresource loads to the
//! versioned blobserve host. [`routes`] serves that host.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::middleware::{from_fn, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use http::header::{CACHE_CONTROL, CONTENT_TYPE, LOCATION};
use http::request::Parts;
use http::{HeaderName, HeaderValue, StatusCode, Uri};
use http_body_util::BodyExt;
use serde::Serialize;
use url::Url;
use wsp_core::WorkspaceInfo;

use super::RouteContext;
use crate::config::{BlobServerConfig, GitpodInstallation};
use crate::proxy::cors::blobserve_cors;
use crate::proxy::{clone_request, ProxyError, ResolveError, RoundTrip};

const FILES_SEPARATOR: &str = "/__files__";
const READ_ONLY: HeaderName = HeaderName::from_static("x-blobserve-readonly");
const INLINE_VARS: HeaderName = HeaderName::from_static("x-blobserve-inlinevars");
const SEC_FETCH_MODE: HeaderName = HeaderName::from_static("sec-fetch-mode");
const SEC_FETCH_DEST: HeaderName = HeaderName::from_static("sec-fetch-dest");
const LONG_TERM_CACHING: &str = "public, max-age=31536000";

/// Which image a request loads, for redirects.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// The workspace's IDE image; index pages get inline vars.
    Ide { supervisor_image: Arc<str> },
    /// The supervisor frontend image.
    Supervisor(Arc<str>),
}

#[derive(Serialize)]
struct InlineVars {
    ide: String,
    supervisor: String,
}

#[derive(Clone)]
pub struct BlobserveTransport {
    inner: Arc<dyn RoundTrip>,
    installation: Arc<GitpodInstallation>,
    blob: Arc<BlobServerConfig>,
    images: ImageSource,
    retry_delay: Duration,
}

impl BlobserveTransport {
    pub fn new(
        inner: Arc<dyn RoundTrip>,
        installation: Arc<GitpodInstallation>,
        blob: Arc<BlobServerConfig>,
        images: ImageSource,
    ) -> Self {
        Self { inner, installation, blob, images, retry_delay: Duration::from_millis(100) }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// `<scheme>://blobserve<suffix>/<image>/__files__<path>`
    pub fn blobserve_url(&self, image: &str, path: &str) -> String {
        format!(
            "{}://{}/{image}{FILES_SEPARATOR}{path}",
            self.installation.scheme,
            self.installation.blobserve_host()
        )
    }

    /// Sends until the blob server stops answering `503 timeout`.
    async fn send(&self, parts: &Parts, body: &Bytes) -> Result<Response, ProxyError> {
        loop {
            let req = clone_request(parts, Body::from(body.clone()));
            let resp = self.inner.round_trip(req).await?;
            let status = resp.status();
            if status.as_u16() < 400 {
                return Ok(resp);
            }

            let text = read_text(resp).await;
            if status == StatusCode::SERVICE_UNAVAILABLE && text == "timeout" {
                tracing::debug!(uri = %parts.uri, "blob server still pulling image, retrying");
                tokio::time::sleep(self.retry_delay).await;
                continue;
            }
            return Err(ProxyError::BlobServer { status, body: text });
        }
    }

    /// Image to redirect to, adding inline vars to index requests of the IDE.
    async fn resolve_image(&self, parts: &mut Parts) -> Option<String> {
        let path = parts.uri.path().to_string();
        match &self.images {
            ImageSource::Supervisor(image) => {
                let rest = path.strip_prefix(&format!("/{image}")).unwrap_or(&path);
                (rest != "/worker-proxy.js").then(|| image.to_string())
            }
            ImageSource::Ide { supervisor_image } => {
                let image = parts.extensions.get::<WorkspaceInfo>()?.ide_image.clone();
                let rest = path.strip_prefix(&format!("/{image}")).unwrap_or(&path);
                if rest == "/" || rest == "/index.html" {
                    self.add_inline_vars(parts, &image, supervisor_image).await;
                }
                Some(image)
            }
        }
    }

    async fn add_inline_vars(&self, parts: &mut Parts, image: &str, supervisor_image: &str) {
        if let Err(e) = self.preload(supervisor_image).await {
            tracing::error!(image = supervisor_image, error = %e, "could not preload supervisor");
            return;
        }
        let vars = InlineVars {
            ide: self.blobserve_url(image, ""),
            supervisor: self.blobserve_url(supervisor_image, ""),
        };
        let value = serde_json::to_string(&vars)
            .ok()
            .and_then(|json| HeaderValue::from_str(&json).ok());
        if let Some(value) = value {
            parts.headers.append(INLINE_VARS, value);
        }
    }

    async fn preload(&self, supervisor_image: &str) -> Result<(), ProxyError> {
        let url = self
            .blob
            .image_url(supervisor_image)
            .and_then(|base| Url::parse(&format!("{base}/main.js")))
            .map_err(|e| ProxyError::InvalidUri(e.to_string()))?;
        let (parts, _) = http::Request::get(url.as_str())
            .body(())
            .map_err(|e| ProxyError::InvalidUri(e.to_string()))?
            .into_parts();
        let resp = self.send(&parts, &Bytes::new()).await?;
        if resp.status() != StatusCode::OK {
            return Err(ProxyError::BlobServer { status: resp.status(), body: String::new() });
        }
        Ok(())
    }

    fn redirect(&self, image: &str, path: &str) -> Response {
        let rest = path.strip_prefix(&format!("/{image}")).unwrap_or(path);
        let location = self.blobserve_url(image, rest);
        let body = format!("<a href=\"{location}\">See Other</a>.\n\n");
        (
            StatusCode::SEE_OTHER,
            [(LOCATION, location), (CONTENT_TYPE, "text/html; charset=utf-8".to_string())],
            body,
        )
            .into_response()
    }
}

/// Whether a successful response may be replaced by a redirect, judged by
/// the fetch metadata of the request.
pub fn redirectable(parts: &Parts, resp: &Response) -> bool {
    if resp.status() != StatusCode::OK || parts.uri.query().is_some_and(|q| !q.is_empty()) {
        return false;
    }
    let dest = header(parts, &SEC_FETCH_DEST);
    let mut mode = header(parts, &SEC_FETCH_MODE);
    let html = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"));
    if mode.is_empty() && html {
        mode = "navigate";
    }
    match mode {
        "navigate" | "nested-navigate" | "websocket" => false,
        "same-origin" => dest == "worker" || dest == "sharedworker",
        _ => true,
    }
}

fn header<'a>(parts: &'a Parts, name: &HeaderName) -> &'a str {
    parts.headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("")
}

async fn read_text(resp: Response) -> String {
    match resp.into_body().collect().await {
        Ok(collected) => String::from_utf8_lossy(&collected.to_bytes()).into_owned(),
        Err(_) => String::new(),
    }
}

#[async_trait]
impl RoundTrip for BlobserveTransport {
    async fn round_trip(&self, req: Request) -> Result<Response, ProxyError> {
        let (mut parts, body) = req.into_parts();
        let body = body.collect().await.map_err(|e| ProxyError::Body(e.to_string()))?.to_bytes();

        let image = self.resolve_image(&mut parts).await;
        let resp = self.send(&parts, &body).await?;
        match image {
            Some(image) if redirectable(&parts, &resp) => Ok(self.redirect(&image, parts.uri.path())),
            _ => Ok(resp),
        }
    }
}

/// Image named by a `/<image>/__files__/<path>` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobImage(pub String);

/// Splits `/<image>/__files__<path>` into the image and the asset path.
pub fn split_files_path(path: &str) -> Option<(&str, &str)> {
    let (image, rest) = path.split_once(FILES_SEPARATOR)?;
    Some((image, if rest.is_empty() { "/" } else { rest }))
}

async fn files_path(mut req: Request, next: Next) -> Response {
    let uri = req.uri().clone();
    if let Some((image, path)) = split_files_path(uri.path()) {
        let path_and_query = match uri.query() {
            Some(query) => format!("{path}?{query}"),
            None => path.to_string(),
        };
        if let Ok(rewritten) = Uri::builder().path_and_query(path_and_query).build() {
            req.extensions_mut().insert(BlobImage(image.trim_start_matches('/').to_string()));
            *req.uri_mut() = rewritten;
            req.headers_mut().insert(READ_ONLY, HeaderValue::from_static("true"));
        }
    }
    next.run(req).await
}

fn long_term_caching(resp: &mut Response) {
    if resp.status() == StatusCode::OK {
        resp.headers_mut().insert(CACHE_CONTROL, HeaderValue::from_static(LONG_TERM_CACHING));
    }
}

/// Routes of the blobserve host.
pub fn routes(ctx: &RouteContext, blob: Arc<BlobServerConfig>) -> Router {
    let pass = ctx
        .pass(move |parts: &Parts| -> Result<Url, ResolveError> {
            let image = parts
                .extensions
                .get::<BlobImage>()
                .ok_or_else(|| ResolveError::Path(parts.uri.path().to_string()))?;
            Ok(blob.image_url(&image.0)?)
        })
        .without_websocket()
        .with_response_handler(long_term_caching);

    pass.into_router().layer(from_fn(files_path)).layer(blobserve_cors())
}

#[cfg(test)]
#[path = "blobserve_tests.rs"]
mod tests;
