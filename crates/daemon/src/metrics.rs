// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request metrics, exported in Prometheus text format on the health listener.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `wsproxy_requests_total` | Counter | `handler`, `status` |
//! | `wsproxy_request_duration_seconds` | Histogram | `handler`, `status` |
//!
//! `handler` is the route table entry that served the request; `status` is
//! the status class (`2xx`, `3xx`, `4xx`, `5xx`, or `1xx` for upgrades).

use std::time::Duration;

use http::StatusCode;
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use thiserror::Error;

const REQUEST_BUCKETS: &[f64] = &[0.005, 0.025, 0.1, 0.5, 1.0, 5.0, 30.0];

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    Register(#[from] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    Encode(String),
}

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests_total: CounterVec,
    request_duration: HistogramVec,
}

impl Metrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("wsproxy_requests_total", "Requests served, by route handler"),
            &["handler", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "wsproxy_request_duration_seconds",
                "Time to response headers, by route handler",
            )
            .buckets(REQUEST_BUCKETS.to_vec()),
            &["handler", "status"],
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self { registry, requests_total, request_duration })
    }

    pub fn record(&self, handler: &str, status: StatusCode, elapsed: Duration) {
        let class = status_class(status);
        self.requests_total.with_label_values(&[handler, class]).inc();
        self.request_duration.with_label_values(&[handler, class]).observe(elapsed.as_secs_f64());
    }

    /// Requests recorded for `handler` with the given status class.
    pub fn request_count(&self, handler: &str, class: &str) -> u64 {
        self.requests_total.with_label_values(&[handler, class]).get() as u64
    }

    pub fn encode_text(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| MetricsError::Encode(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Encode(e.to_string()))
    }
}

pub fn status_class(status: StatusCode) -> &'static str {
    match status.as_u16() {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
