// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proxy-pass engine.
//!
//! A [`ProxyPass`] pairs a [`TargetResolver`] with an [`ErrorHandler`] and
//! optional [`ResponseHandler`]s. Each request is resolved and then
//! forwarded either through the pooled HTTP client or, for WebSocket
//! upgrades on routes that allow them, through the WebSocket bridge.

pub mod cookies;
pub mod cors;
mod errors;
mod forward;
mod transport;
mod ws;

pub use errors::{classify, ErrorClass, ProxyError, ResolveError};
pub use forward::{is_websocket_upgrade, join_url, strip_hop_by_hop};
pub use transport::{build_client, HttpClient, HttpTransport, RoundTrip};
pub use ws::websocket_url;

use std::sync::Arc;

use http::request::Parts;
use http::{HeaderMap, Request, StatusCode};
use async_trait::async_trait;
use axum::body::Body;
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use url::Url;

use crate::config::TransportConfig;
use ws::WebSocketSettings;

/// Computes the backend base URL for a request.
pub trait TargetResolver: Send + Sync {
    fn resolve(&self, parts: &Parts) -> Result<Url, ResolveError>;
}

impl<F> TargetResolver for F
where
    F: Fn(&Parts) -> Result<Url, ResolveError> + Send + Sync,
{
    fn resolve(&self, parts: &Parts) -> Result<Url, ResolveError> {
        self(parts)
    }
}

/// Produces the response for a failed forward. Receives the request as it
/// arrived, before any target rewriting, with an empty body.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn handle(&self, req: Request<Body>, err: ProxyError) -> Response;
}

/// Inspects or edits a successful backend response.
pub trait ResponseHandler: Send + Sync {
    fn handle(&self, resp: &mut Response);
}

impl<F> ResponseHandler for F
where
    F: Fn(&mut Response) + Send + Sync,
{
    fn handle(&self, resp: &mut Response) {
        self(resp)
    }
}

/// Default error handler: log the classified cause and answer 502.
#[derive(Debug, Clone, Copy, Default)]
pub struct BadGateway;

#[async_trait]
impl ErrorHandler for BadGateway {
    async fn handle(&self, req: Request<Body>, err: ProxyError) -> Response {
        tracing::warn!(uri = %req.uri(), cause = %err.class(), error = %err, "backend unavailable");
        StatusCode::BAD_GATEWAY.into_response()
    }
}

/// Hands a failed request, as it arrived, to another service.
pub struct Fallback(pub axum::Router);

#[async_trait]
impl ErrorHandler for Fallback {
    async fn handle(&self, req: Request<Body>, err: ProxyError) -> Response {
        tracing::debug!(uri = %req.uri(), error = %err, "primary backend failed, trying fallback");
        match self.0.clone().oneshot(req).await {
            Ok(resp) => resp,
            Err(never) => match never {},
        }
    }
}

/// How a request will be forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    WebSocket,
    Http,
}

pub fn select_dispatch(headers: &HeaderMap, websocket_enabled: bool) -> Dispatch {
    if websocket_enabled && is_websocket_upgrade(headers) {
        Dispatch::WebSocket
    } else {
        Dispatch::Http
    }
}

#[derive(Clone)]
pub struct ProxyPass {
    transport: Arc<dyn RoundTrip>,
    resolver: Arc<dyn TargetResolver>,
    error_handler: Arc<dyn ErrorHandler>,
    response_handlers: Vec<Arc<dyn ResponseHandler>>,
    websocket: Option<WebSocketSettings>,
}

impl ProxyPass {
    /// A WebSocket-capable pass answering 502 on backend failure.
    pub fn new(
        transport: Arc<dyn RoundTrip>,
        transport_config: &TransportConfig,
        resolver: impl TargetResolver + 'static,
    ) -> Self {
        Self {
            transport,
            resolver: Arc::new(resolver),
            error_handler: Arc::new(BadGateway),
            response_handlers: Vec::new(),
            websocket: Some(WebSocketSettings {
                connect_timeout: transport_config.connect_timeout,
                idle_timeout: transport_config.websocket_idle_conn_timeout,
            }),
        }
    }

    pub fn with_error_handler(mut self, handler: impl ErrorHandler + 'static) -> Self {
        self.error_handler = Arc::new(handler);
        self
    }

    pub fn with_response_handler(mut self, handler: impl ResponseHandler + 'static) -> Self {
        self.response_handlers.push(Arc::new(handler));
        self
    }

    /// Forwards upgrade requests as plain HTTP.
    pub fn without_websocket(mut self) -> Self {
        self.websocket = None;
        self
    }

    pub fn dispatch(&self, headers: &HeaderMap) -> Dispatch {
        select_dispatch(headers, self.websocket.is_some())
    }

    /// A router sending every request through this pass.
    pub fn into_router(self) -> axum::Router {
        axum::Router::new().fallback(move |req: Request<Body>| {
            let pass = self.clone();
            async move { pass.serve(req).await }
        })
    }

    pub async fn serve(&self, req: Request<Body>) -> Response {
        let (mut parts, body) = req.into_parts();

        let target = match self.resolver.resolve(&parts) {
            Ok(target) => target,
            Err(e) => {
                tracing::error!(uri = %parts.uri, error = %e, "cannot resolve proxy target");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };
        let original = clone_request(&parts, Body::empty());

        let result = match (self.dispatch(&parts.headers), self.websocket) {
            (Dispatch::WebSocket, Some(settings)) => ws::serve(settings, &mut parts, &target).await,
            _ => self.forward(parts, body, &target).await,
        };

        match result {
            Ok(mut resp) => {
                if resp.status() != StatusCode::SWITCHING_PROTOCOLS {
                    for handler in &self.response_handlers {
                        handler.handle(&mut resp);
                    }
                }
                resp
            }
            Err(err) => self.error_handler.handle(original, err).await,
        }
    }

    async fn forward(&self, mut parts: Parts, body: Body, target: &Url) -> Result<Response, ProxyError> {
        forward::rewrite(&mut parts, target)?;
        let mut resp = self.transport.round_trip(Request::from_parts(parts, body)).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ProxyError::BackendNotFound);
        }
        strip_hop_by_hop(resp.headers_mut());
        Ok(resp)
    }
}

/// A request with a copy of `parts` as its head.
pub fn clone_request(parts: &Parts, body: Body) -> Request<Body> {
    let mut req = Request::new(body);
    *req.method_mut() = parts.method.clone();
    *req.uri_mut() = parts.uri.clone();
    *req.version_mut() = parts.version;
    *req.headers_mut() = parts.headers.clone();
    *req.extensions_mut() = parts.extensions.clone();
    req
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
