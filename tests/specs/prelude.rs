// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness: echo backend, fake orchestrator, gateway under test.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::extract::{Request, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use http_body_util::BodyExt;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use wsp_core::{PortSpec, PortVisibility, WorkspaceAuthentication, WorkspacePhase};
use wsp_daemon::directory::Directory;
use wsp_daemon::proxy::cookies::owner_cookie_name;
use wsp_daemon::routes::PORT_NOT_FOUND_PAGE;
use wsp_daemon::Config;
use wsp_wire::{GetWorkspacesResponse, SubscribeEvent, WorkspaceStatus};

pub use http::header::{COOKIE, HOST, LOCATION};
pub use http::{HeaderMap, StatusCode};
pub use wsp_core::test_support::{INSTANCE_ID, WORKSPACE_ID};

pub const HOST_NAME: &str = "test-domain.com";
pub const TOKEN: &str = "owner-secret";
pub const NOT_FOUND_PAGE: &str = r#"<h1>Port not ready</h1><a href="https://gitpod.io">back</a>"#;

pub fn workspace_host(id: &str) -> String {
    format!("{id}.ws.{HOST_NAME}")
}

pub fn port_host(port: u16, id: &str) -> String {
    format!("{port}-{id}.ws.{HOST_NAME}")
}

pub fn owner_cookie() -> String {
    format!("{}={TOKEN}", owner_cookie_name(HOST_NAME, INSTANCE_ID))
}

pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

/// A port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

// ── Backend ─────────────────────────────────────────────────────────────

/// Echoes what it received as JSON; `/ws` echoes WebSocket frames.
pub async fn echo_backend() -> SocketAddr {
    let app = Router::new().route("/ws", get(ws_echo)).fallback(echo);
    serve(app).await
}

async fn echo(req: Request) -> Json<Value> {
    let header = |name: &str| req.headers().get(name).and_then(|v| v.to_str().ok()).map(String::from);
    Json(json!({
        "path": req.uri().path(),
        "query": req.uri().query(),
        "cookie": header("cookie"),
        "x-forwarded-proto": header("x-forwarded-proto"),
        "x-forwarded-host": header("x-forwarded-host"),
    }))
}

async fn ws_echo(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(|mut socket| async move {
        while let Some(Ok(msg)) = socket.recv().await {
            if matches!(msg, Message::Text(_) | Message::Binary(_)) && socket.send(msg).await.is_err() {
                break;
            }
        }
    })
}

// ── Orchestrator ────────────────────────────────────────────────────────

#[derive(Clone)]
struct ManagerState {
    snapshot: Arc<Mutex<Vec<WorkspaceStatus>>>,
    events: broadcast::Sender<SubscribeEvent>,
}

/// Serves `/api/workspaces` and the `/api/subscribe` WebSocket stream.
pub struct FakeManager {
    pub addr: SocketAddr,
    state: ManagerState,
}

impl FakeManager {
    pub async fn start(snapshot: Vec<WorkspaceStatus>) -> Self {
        let (events, _) = broadcast::channel(64);
        let state = ManagerState { snapshot: Arc::new(Mutex::new(snapshot)), events };
        let app = Router::new()
            .route("/api/workspaces", get(workspaces))
            .route("/api/subscribe", get(subscribe))
            .with_state(state.clone());
        Self { addr: serve(app).await, state }
    }

    /// Broadcasts a status to every open subscription.
    pub fn publish(&self, status: WorkspaceStatus) {
        self.state.snapshot.lock().retain(|s| s.id != status.id);
        self.state.snapshot.lock().push(status.clone());
        let _ = self.state.events.send(SubscribeEvent::status(status));
    }

    pub fn subscribers(&self) -> usize {
        self.state.events.receiver_count()
    }
}

async fn workspaces(State(state): State<ManagerState>) -> Json<GetWorkspacesResponse> {
    Json(GetWorkspacesResponse { status: state.snapshot.lock().clone() })
}

async fn subscribe(State(state): State<ManagerState>, ws: WebSocketUpgrade) -> Response {
    // Subscribe before the handshake completes so no event is missed.
    let mut events = state.events.subscribe();
    ws.on_upgrade(|mut socket| async move {
        while let Ok(event) = events.recv().await {
            let Ok(text) = serde_json::to_string(&event) else { continue };
            if socket.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    })
}

pub fn running(id: &str, instance: &str, ports: Vec<PortSpec>) -> WorkspaceStatus {
    wsp_daemon::test_support::status_with(
        id,
        instance,
        WorkspacePhase::Running,
        ports,
        WorkspaceAuthentication::new(wsp_core::AdmissionLevel::OwnerOnly, TOKEN),
    )
}

/// An exposed port whose public port equals `port`.
pub fn exposed(port: u16, id: &str, visibility: PortVisibility) -> PortSpec {
    PortSpec {
        port: u32::from(port),
        visibility,
        protocol: "http".to_string(),
        target: u32::from(port),
        url: format!("https://{}:{port}", port_host(port, id)),
    }
}

// ── Gateway ─────────────────────────────────────────────────────────────

pub struct Gateway {
    pub addr: SocketAddr,
    pub directory: Arc<Directory>,
    shutdown: CancellationToken,
    _pages: TempDir,
}

impl Gateway {
    /// Starts the gateway with every workspace service on `backend`, and
    /// waits until the directory holds the orchestrator's snapshot.
    pub async fn start(manager: &FakeManager, backend: SocketAddr) -> Self {
        let pages = TempDir::new().unwrap();
        std::fs::write(pages.path().join(PORT_NOT_FOUND_PAGE), NOT_FOUND_PAGE).unwrap();

        let config = json!({
            "ingress": { "httpAddress": "127.0.0.1:0" },
            "proxy": {
                "gitpodInstallation": {
                    "scheme": "https",
                    "hostName": HOST_NAME,
                    "workspaceHostSuffix": format!(".ws.{HOST_NAME}"),
                },
                "workspacePodConfig": {
                    "serviceTemplate": "http://127.0.0.1:{{ .port }}",
                    "portServiceTemplate": "http://127.0.0.1:{{ .port }}",
                    "idePort": backend.port(),
                    "supervisorPort": backend.port(),
                },
                "builtinPages": { "location": pages.path() },
            },
            "workspaceInfoProviderConfig": {
                "wsManagerAddr": format!("http://{}/api", manager.addr),
                "reconnectInterval": "100ms",
            },
        });
        let config = Config::from_slice(&serde_json::to_vec(&config).unwrap()).unwrap();

        let daemon = wsp_daemon::startup(config).unwrap();
        let directory = daemon.directory.clone();
        let shutdown = daemon.shutdown_token();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(daemon.serve_on(listener));

        eventually(|| directory.is_ready()).await;
        Self { addr, directory, shutdown, _pages: pages }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{path}", self.addr)
    }

    pub async fn get(&self, host: &str, path: &str, headers: &[(&str, &str)]) -> Reply {
        let mut req = http::Request::get(self.url(path)).header(HOST, host);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        let client = Client::builder(TokioExecutor::new()).build_http::<Body>();
        let resp = client.request(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        Reply { status, headers, body: String::from_utf8_lossy(&bytes).into_owned() }
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|e| panic!("not JSON ({e}): {}", self.body))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Polls `condition` until it holds; panics after five seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met within 5s");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
