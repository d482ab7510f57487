// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for daemon unit tests and the integration suite.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::response::{IntoResponse, Response};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method, Request, StatusCode, Uri};
use parking_lot::Mutex;
use wsp_core::{PortSpec, WorkspaceAuthentication, WorkspacePhase};
use wsp_wire::{IdeImage, WorkspaceMetadata, WorkspaceSpec, WorkspaceStatus};

use crate::config::Config;
use crate::proxy::{ProxyError, RoundTrip};

/// A complete, valid configuration using the host routing strategy.
pub const CONFIG_JSON: &str = r#"{
    "ingress": { "httpAddress": "127.0.0.1:8080" },
    "proxy": {
        "transportConfig": {
            "connectTimeout": "10s",
            "idleConnTimeout": "60s",
            "websocketIdleConnTimeout": "180s",
            "maxIdleConns": 100
        },
        "blobServer": { "scheme": "http", "host": "blobserve.gitpod.svc:4000" },
        "gitpodInstallation": {
            "scheme": "https",
            "hostName": "test-domain.com",
            "workspaceHostSuffix": ".ws.test-domain.com"
        },
        "workspacePodConfig": {
            "serviceTemplate": "http://ws-{{ .workspaceID }}-theia:{{ .port }}",
            "portServiceTemplate": "http://ws-{{ .workspaceID }}-ports:{{ .port }}",
            "idePort": 23000,
            "supervisorPort": 22999,
            "supervisorImage": "eu.gcr.io/gitpod/supervisor:latest"
        },
        "builtinPages": { "location": "public" }
    },
    "workspaceInfoProviderConfig": {
        "wsManagerAddr": "http://ws-manager:8080/api",
        "reconnectInterval": "3s"
    }
}"#;

/// [`CONFIG_JSON`] parsed, after `patch` edits the JSON.
#[allow(clippy::expect_used)]
pub fn config_with(patch: impl FnOnce(&mut serde_json::Value)) -> Config {
    let mut value: serde_json::Value =
        serde_json::from_str(CONFIG_JSON).expect("CONFIG_JSON is valid JSON");
    patch(&mut value);
    let raw = serde_json::to_vec(&value).expect("serialize patched config");
    Config::from_slice(&raw).expect("patched config is valid")
}

pub fn config() -> Config {
    config_with(|_| {})
}

/// A running-style status with no ports and a default (owner-only) auth.
pub fn status(workspace_id: &str, instance_id: &str, phase: WorkspacePhase) -> WorkspaceStatus {
    status_with(workspace_id, instance_id, phase, Vec::new(), WorkspaceAuthentication::default())
}

pub fn status_with(
    workspace_id: &str,
    instance_id: &str,
    phase: WorkspacePhase,
    exposed_ports: Vec<PortSpec>,
    auth: WorkspaceAuthentication,
) -> WorkspaceStatus {
    WorkspaceStatus {
        id: instance_id.into(),
        metadata: WorkspaceMetadata { meta_id: workspace_id.into(), started_at: None },
        spec: WorkspaceSpec {
            url: format!("https://{workspace_id}.ws.test-domain.com"),
            ide_image: IdeImage { web_ref: "eu.gcr.io/gitpod/ide/theia:latest".to_string() },
            exposed_ports,
        },
        phase,
        auth,
    }
}

/// Polls `condition` every few milliseconds; panics after two seconds.
#[allow(clippy::panic)]
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("condition not met within 2s");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// A request as the transport saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

struct Reply {
    status: StatusCode,
    content_type: &'static str,
    body: &'static str,
}

/// Transport that records every request and answers from a queue of
/// replies, then `200 ok` once the queue is empty.
#[derive(Default)]
pub struct RecordingTransport {
    seen: Mutex<Vec<RecordedRequest>>,
    replies: Mutex<VecDeque<Reply>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, status: StatusCode, body: &'static str) {
        self.reply_as(status, "text/plain", body);
    }

    pub fn reply_as(&self, status: StatusCode, content_type: &'static str, body: &'static str) {
        self.replies.lock().push_back(Reply { status, content_type, body });
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.seen.lock().clone()
    }

    pub fn uris(&self) -> Vec<String> {
        self.seen.lock().iter().map(|r| r.uri.to_string()).collect()
    }
}

#[async_trait]
impl RoundTrip for RecordingTransport {
    async fn round_trip(&self, req: Request<Body>) -> Result<Response, ProxyError> {
        self.seen.lock().push(RecordedRequest {
            method: req.method().clone(),
            uri: req.uri().clone(),
            headers: req.headers().clone(),
        });
        let reply = self.replies.lock().pop_front().unwrap_or(Reply {
            status: StatusCode::OK,
            content_type: "text/plain",
            body: "ok",
        });
        Ok((reply.status, [(CONTENT_TYPE, reply.content_type)], reply.body).into_response())
    }
}
