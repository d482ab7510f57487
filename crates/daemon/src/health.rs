// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Readiness, liveness and metrics endpoints, served on their own listener.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use http::header::CONTENT_TYPE;
use http::StatusCode;

use crate::directory::Directory;
use crate::metrics::Metrics;

const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4";

#[derive(Clone)]
struct HealthState {
    directory: Arc<Directory>,
    metrics: Arc<Metrics>,
}

pub fn router(directory: Arc<Directory>, metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/ready", get(ready))
        .route("/live", get(live))
        .route("/metrics", get(metrics_text))
        .with_state(HealthState { directory, metrics })
}

/// Ready once the directory holds a full snapshot from the orchestrator.
async fn ready(State(state): State<HealthState>) -> StatusCode {
    if state.directory.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn live() -> StatusCode {
    StatusCode::OK
}

async fn metrics_text(State(state): State<HealthState>) -> Response {
    match state.metrics.encode_text() {
        Ok(text) => ([(CONTENT_TYPE, PROMETHEUS_TEXT)], text).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "cannot encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
