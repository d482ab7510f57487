// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exposed ports: visibility, cookie filtering, forwarding headers and
//! the not-found page.

use crate::prelude::*;
use wsp_core::PortVisibility;

#[tokio::test]
async fn public_port_is_open_and_never_sees_platform_cookies() {
    let backend = echo_backend().await;
    let port = backend.port();
    let manager = FakeManager::start(vec![running(
        WORKSPACE_ID,
        INSTANCE_ID,
        vec![exposed(port, WORKSPACE_ID, PortVisibility::Public)],
    )])
    .await;
    let gateway = Gateway::start(&manager, backend).await;
    let host = port_host(port, WORKSPACE_ID);
    let cookies = format!("{}; _test_domain_com_=session; theme=dark", owner_cookie());

    let reply = gateway.get(&host, "/api/items", &[("cookie", cookies.as_str())]).await;

    assert_eq!(reply.status, StatusCode::OK);
    let echoed = reply.json();
    assert_eq!(echoed["path"], "/api/items");
    assert_eq!(echoed["cookie"], "theme=dark");
    assert_eq!(echoed["x-forwarded-proto"], "https");
    assert_eq!(echoed["x-forwarded-host"], format!("{host}:443"));
}

#[tokio::test]
async fn private_port_requires_the_owner() {
    let backend = echo_backend().await;
    let port = backend.port();
    let manager = FakeManager::start(vec![running(
        WORKSPACE_ID,
        INSTANCE_ID,
        vec![exposed(port, WORKSPACE_ID, PortVisibility::Private)],
    )])
    .await;
    let gateway = Gateway::start(&manager, backend).await;
    let host = port_host(port, WORKSPACE_ID);

    let anonymous = gateway.get(&host, "/", &[]).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let cookie = owner_cookie();
    let owner = gateway.get(&host, "/", &[("cookie", cookie.as_str())]).await;
    assert_eq!(owner.status, StatusCode::OK);
    assert_eq!(owner.json()["cookie"], serde_json::Value::Null);
}

#[tokio::test]
async fn nothing_listening_serves_the_not_found_page() {
    let backend = echo_backend().await;
    let port = closed_port().await;
    let manager = FakeManager::start(vec![running(
        WORKSPACE_ID,
        INSTANCE_ID,
        vec![exposed(port, WORKSPACE_ID, PortVisibility::Public)],
    )])
    .await;
    let gateway = Gateway::start(&manager, backend).await;

    let reply = gateway.get(&port_host(port, WORKSPACE_ID), "/", &[]).await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(reply.body.contains("Port not ready"));
    assert!(reply.body.contains(&format!("https://{HOST_NAME}")), "origin not rewritten: {}", reply.body);
}
