// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::proxy::cookies::owner_cookie_name;
use crate::test_support::{config_with, RecordingTransport};
use axum::body::Body;
use http::header::{ACCEPT, COOKIE, HOST, LOCATION};
use tempfile::TempDir;
use wsp_core::test_support::{owner_only, port, WORKSPACE_ID};
use wsp_core::{PortVisibility, WorkspaceInfo};
use yare::parameterized;

const TOKEN: &str = "owner-secret";
const INSTANCE: &str = "inst-1";

struct Harness {
    app: Router,
    transport: Arc<RecordingTransport>,
    metrics: Arc<Metrics>,
    _pages: TempDir,
}

fn harness(with_blob: bool) -> Harness {
    let pages = TempDir::new().unwrap();
    std::fs::write(pages.path().join(PORT_NOT_FOUND_PAGE), "<a href=\"https://gitpod.io\">home</a>").unwrap();
    let location = pages.path().to_string_lossy().into_owned();
    let config = config_with(|v| {
        v["proxy"]["builtinPages"]["location"] = location.into();
        if !with_blob {
            v["proxy"].as_object_mut().unwrap().remove("blobServer");
        }
    });

    let directory = Directory::new();
    directory.insert(
        WorkspaceInfo::builder()
            .workspace_id(WORKSPACE_ID)
            .instance_id(INSTANCE)
            .auth(owner_only(TOKEN))
            .ports(vec![
                port(1234, "31234", PortVisibility::Public),
                port(5000, "35000", PortVisibility::Private),
            ])
            .build(),
    );

    let transport = RecordingTransport::new();
    let metrics = Arc::new(Metrics::new().unwrap());
    let ctx = RouteContext::new(Arc::new(config), directory, transport.clone());
    let app = super::app(&ctx, metrics.clone()).unwrap();
    Harness { app, transport, metrics, _pages: pages }
}

fn workspace_host() -> String {
    format!("{WORKSPACE_ID}.ws.test-domain.com")
}

fn request(host: &str, path: &str) -> http::request::Builder {
    http::Request::builder().uri(path).header(HOST, host)
}

fn owner_cookie() -> String {
    format!("{}={TOKEN}", owner_cookie_name("test-domain.com", INSTANCE))
}

async fn send(h: &Harness, req: http::request::Builder) -> Response {
    h.app.clone().oneshot(req.body(Body::empty()).unwrap()).await.unwrap()
}

#[parameterized(
    exact_hit = { PathPattern::Exact("/services"), "/services", true },
    exact_miss_on_subpath = { PathPattern::Exact("/services"), "/services/x", false },
    prefix_subpath = { PathPattern::Prefix("/file"), "/file/a.txt", true },
    prefix_is_string_prefix = { PathPattern::Prefix("/file"), "/files", true },
    prefix_miss = { PathPattern::Prefix("/file"), "/fil", false },
    any = { PathPattern::Any, "/whatever", true },
)]
fn path_patterns(pattern: PathPattern, path: &str, expected: bool) {
    assert_eq!(pattern.matches(path), expected);
}

#[test]
fn first_matching_route_wins() {
    let table = RouteTable::new()
        .route("status", PathPattern::Prefix("/_supervisor/v1/status"), Router::new())
        .route("supervisor", PathPattern::Prefix("/_supervisor"), Router::new())
        .route("root", PathPattern::Any, Router::new());

    assert_eq!(table.find("/_supervisor/v1/status/ide").map(|(n, _)| n), Some("status"));
    assert_eq!(table.find("/_supervisor/v1/run").map(|(n, _)| n), Some("supervisor"));
    assert_eq!(table.find("/index.html").map(|(n, _)| n), Some("root"));
    assert_eq!(table.names().collect::<Vec<_>>(), vec!["status", "supervisor", "root"]);
}

#[tokio::test]
async fn unmatched_host_is_404() {
    let h = harness(true);
    let resp = send(&h, request("example.org", "/")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(h.transport.requests().is_empty());
    assert_eq!(h.metrics.request_count("not-found", "4xx"), 1);
}

#[tokio::test]
async fn unknown_workspace_redirects_to_start_page() {
    let h = harness(true);
    let other = "0b0c8b7e-1111-4222-8333-944455556666";
    let resp = send(&h, request(&format!("{other}.ws.test-domain.com"), "/")).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers()[LOCATION],
        format!("https://test-domain.com/start/?not_found=true#{other}").as_str()
    );
}

#[tokio::test]
async fn root_serves_ide_assets_from_blob_server() {
    let h = harness(true);
    let req = request(&workspace_host(), "/").header(ACCEPT, "text/html").header("sec-fetch-mode", "navigate");
    let resp = send(&h, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let uris = h.transport.uris();
    assert_eq!(uris[0], "http://blobserve.gitpod.svc:4000/eu.gcr.io/gitpod/supervisor:latest/main.js");
    assert_eq!(uris[1], "http://blobserve.gitpod.svc:4000/eu.gcr.io/gitpod/ide/theia:latest/");
    assert_eq!(h.metrics.request_count("root", "2xx"), 1);
}

#[tokio::test]
async fn root_falls_back_to_authenticated_pod() {
    let h = harness(true);
    h.transport.reply(StatusCode::NOT_FOUND, "no such file");
    h.transport.reply(StatusCode::NOT_FOUND, "no such file");

    let denied = send(&h, request(&workspace_host(), "/app.js")).await;
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let resp = send(&h, request(&workspace_host(), "/app.js").header(COOKIE, owner_cookie())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let uris = h.transport.uris();
    assert_eq!(uris.len(), 3);
    assert_eq!(uris[2], format!("http://ws-{WORKSPACE_ID}-theia:23000/app.js"));
}

#[tokio::test]
async fn root_without_blob_server_requires_owner() {
    let h = harness(false);
    let denied = send(&h, request(&workspace_host(), "/")).await;
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let resp = send(&h, request(&workspace_host(), "/").header(crate::auth::OWNER_TOKEN_HEADER, TOKEN)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(h.transport.uris(), vec![format!("http://ws-{WORKSPACE_ID}-theia:23000/")]);
}

#[parameterized(
    services = { "/services" },
    file_upload = { "/file-upload" },
    mini_browser = { "/mini-browser/index.html" },
    files = { "/files/src/main.rs" },
    hosted_plugin = { "/hostedPlugin/x" },
    webview = { "/webview/pre/index.html" },
)]
fn direct_ide_routes_require_owner(path: &str) {
    tokio::runtime::Runtime::new().unwrap().block_on(async {
        let h = harness(true);
        let denied = send(&h, request(&workspace_host(), path)).await;
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let resp = send(&h, request(&workspace_host(), path).header(COOKIE, owner_cookie())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(h.transport.uris(), vec![format!("http://ws-{WORKSPACE_ID}-theia:23000{path}")]);
        assert_eq!(h.metrics.request_count("direct-ide", "2xx"), 1);
    });
}

#[parameterized(
    supervisor_status = { "/_supervisor/v1/status/supervisor", StatusCode::OK },
    ide_status = { "/_supervisor/v1/status/ide/wait/true", StatusCode::OK },
    api = { "/_supervisor/v1/terminal/list", StatusCode::UNAUTHORIZED },
    other = { "/_supervisor/tunnel", StatusCode::UNAUTHORIZED },
)]
fn supervisor_routes_without_credentials(path: &str, expected: StatusCode) {
    tokio::runtime::Runtime::new().unwrap().block_on(async {
        let h = harness(true);
        let resp = send(&h, request(&workspace_host(), path)).await;
        assert_eq!(resp.status(), expected);
        if expected == StatusCode::OK {
            assert_eq!(h.transport.uris(), vec![format!("http://ws-{WORKSPACE_ID}-theia:22999{path}")]);
        }
    });
}

#[tokio::test]
async fn favicon_comes_from_supervisor_image() {
    let h = harness(true);
    let resp = send(&h, request(&workspace_host(), "/favicon.ico")).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        h.transport.uris(),
        vec!["http://blobserve.gitpod.svc:4000/eu.gcr.io/gitpod/supervisor:latest/favicon.ico".to_string()]
    );
    assert_eq!(h.metrics.request_count("favicon", "3xx"), 1);
}

#[tokio::test]
async fn supervisor_frontend_without_blob_server_hits_supervisor() {
    let h = harness(false);
    let resp = send(&h, request(&workspace_host(), "/_supervisor/frontend/main.js")).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        h.transport.uris(),
        vec![format!("http://ws-{WORKSPACE_ID}-theia:22999/_supervisor/frontend/main.js")]
    );
}

#[tokio::test]
async fn public_port_is_reachable_without_credentials() {
    let h = harness(true);
    let host = format!("1234-{WORKSPACE_ID}.ws.test-domain.com");
    let resp = send(&h, request(&host, "/")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(h.transport.uris(), vec![format!("http://ws-{WORKSPACE_ID}-ports:1234/")]);
}

#[tokio::test]
async fn exposed_port_never_sees_platform_cookies() {
    let h = harness(true);
    let host = format!("1234-{WORKSPACE_ID}.ws.test-domain.com");
    let cookies = format!("{}; _test_domain_com_=session; theme=dark", owner_cookie());
    let resp = send(&h, request(&host, "/api?x=1").header(COOKIE, cookies)).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let seen = h.transport.requests();
    assert_eq!(seen[0].uri, format!("http://ws-{WORKSPACE_ID}-ports:1234/api?x=1").as_str());
    assert_eq!(seen[0].header("cookie"), Some("theme=dark"));
    assert_eq!(seen[0].header("x-forwarded-proto"), Some("https"));
    assert_eq!(seen[0].header("x-forwarded-host"), Some(format!("{host}:443").as_str()));
    assert_eq!(h.metrics.request_count("port", "2xx"), 1);
}

#[tokio::test]
async fn private_port_requires_owner() {
    let h = harness(true);
    let host = format!("5000-{WORKSPACE_ID}.ws.test-domain.com");
    let resp = send(&h, request(&host, "/")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn blobserve_host_is_routed_to_blob_server() {
    let h = harness(true);
    let resp = send(&h, request("blobserve.ws.test-domain.com", "/theia:1/__files__/main.js")).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(h.transport.uris(), vec!["http://blobserve.gitpod.svc:4000/theia:1/main.js".to_string()]);
    assert_eq!(h.metrics.request_count("blobserve", "2xx"), 1);
}

#[tokio::test]
async fn blobserve_host_without_blob_server_is_404() {
    let h = harness(false);
    let resp = send(&h, request("blobserve.ws.test-domain.com", "/theia:1/__files__/main.js")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[test]
fn missing_builtin_page_fails_startup() {
    let config = config_with(|v| v["proxy"]["builtinPages"]["location"] = "/nonexistent/pages".into());
    let ctx = RouteContext::new(Arc::new(config), Directory::new(), RecordingTransport::new());
    let err = super::app(&ctx, Arc::new(Metrics::new().unwrap())).err().unwrap();
    assert!(matches!(err, RouteError::Page { .. }), "unexpected error: {err}");
}
