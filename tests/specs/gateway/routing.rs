// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace host routing and owner authentication.

use crate::prelude::*;

async fn setup() -> (FakeManager, Gateway) {
    let backend = echo_backend().await;
    let manager = FakeManager::start(vec![running(WORKSPACE_ID, INSTANCE_ID, vec![])]).await;
    let gateway = Gateway::start(&manager, backend).await;
    (manager, gateway)
}

#[tokio::test]
async fn owner_cookie_reaches_the_ide() {
    let (_manager, gateway) = setup().await;
    let cookie = owner_cookie();

    let reply = gateway
        .get(&workspace_host(WORKSPACE_ID), "/index.html?folder=x", &[("cookie", cookie.as_str())])
        .await;

    assert_eq!(reply.status, StatusCode::OK);
    let echoed = reply.json();
    assert_eq!(echoed["path"], "/index.html");
    assert_eq!(echoed["query"], "folder=x");
}

#[tokio::test]
async fn owner_token_header_reaches_the_ide() {
    let (_manager, gateway) = setup().await;
    let reply = gateway
        .get(&workspace_host(WORKSPACE_ID), "/", &[("x-gitpod-owner-token", TOKEN)])
        .await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn ide_without_credentials_is_unauthorized() {
    let (_manager, gateway) = setup().await;
    let reply = gateway.get(&workspace_host(WORKSPACE_ID), "/", &[]).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_owner_token_is_forbidden() {
    let (_manager, gateway) = setup().await;
    let reply = gateway
        .get(&workspace_host(WORKSPACE_ID), "/", &[("x-gitpod-owner-token", "not-the-token")])
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn supervisor_status_needs_no_credentials() {
    let (_manager, gateway) = setup().await;
    let reply =
        gateway.get(&workspace_host(WORKSPACE_ID), "/_supervisor/v1/status/ide/wait/true", &[]).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["path"], "/_supervisor/v1/status/ide/wait/true");
}

#[tokio::test]
async fn unknown_workspace_goes_to_start_page() {
    let (_manager, gateway) = setup().await;
    let other = "0b0c8b7e-1111-4222-8333-944455556666";

    let reply = gateway.get(&workspace_host(other), "/", &[]).await;

    assert_eq!(reply.status, StatusCode::FOUND);
    assert_eq!(
        reply.header("location"),
        Some(format!("https://{HOST_NAME}/start/?not_found=true#{other}").as_str())
    );
}

#[tokio::test]
async fn foreign_host_is_not_found() {
    let (_manager, gateway) = setup().await;
    let reply = gateway.get("example.org", "/", &[]).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}
