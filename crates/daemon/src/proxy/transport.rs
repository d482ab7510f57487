// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pooled outbound HTTP client and the round-trip seam used by proxy passes.

use async_trait::async_trait;
use axum::body::Body;
use axum::response::Response;
use http::Request;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};

use super::ProxyError;
use crate::config::TransportConfig;

pub type HttpClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Builds the shared backend client from the pool settings.
pub fn build_client(config: &TransportConfig) -> HttpClient {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_nodelay(true);
    http.set_connect_timeout(Some(config.connect_timeout));

    let https = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Client::builder(TokioExecutor::new())
        .pool_timer(TokioTimer::new())
        .pool_idle_timeout(config.idle_conn_timeout)
        .pool_max_idle_per_host(config.max_idle_conns)
        .build(https)
}

/// Sends one request to a backend.
#[async_trait]
pub trait RoundTrip: Send + Sync {
    async fn round_trip(&self, req: Request<Body>) -> Result<Response, ProxyError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: HttpClient,
}

impl HttpTransport {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RoundTrip for HttpTransport {
    async fn round_trip(&self, req: Request<Body>) -> Result<Response, ProxyError> {
        let response = self.client.request(req).await.map_err(ProxyError::Transport)?;
        Ok(response.map(Body::new))
    }
}
