// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The directory follows the orchestrator's subscription stream.

use crate::prelude::*;
use wsp_core::WorkspacePhase;

const LATE_ID: &str = "5e1d7a9c-2b3f-4c8d-9e0f-1a2b3c4d5e6f";
const LATE_INSTANCE: &str = "c0ffee00-1234-4567-89ab-cdef01234567";

#[tokio::test]
async fn workspace_started_after_boot_becomes_reachable() {
    let backend = echo_backend().await;
    let manager = FakeManager::start(vec![]).await;
    let gateway = Gateway::start(&manager, backend).await;
    eventually(|| manager.subscribers() > 0).await;

    let before = gateway.get(&workspace_host(LATE_ID), "/_supervisor/v1/status/supervisor", &[]).await;
    assert_eq!(before.status, StatusCode::FOUND);

    manager.publish(running(LATE_ID, LATE_INSTANCE, vec![]));
    eventually(|| gateway.directory.lookup(LATE_ID).is_some()).await;

    let after = gateway.get(&workspace_host(LATE_ID), "/_supervisor/v1/status/supervisor", &[]).await;
    assert_eq!(after.status, StatusCode::OK);
}

#[tokio::test]
async fn stopped_workspace_is_removed() {
    let backend = echo_backend().await;
    let manager = FakeManager::start(vec![running(WORKSPACE_ID, INSTANCE_ID, vec![])]).await;
    let gateway = Gateway::start(&manager, backend).await;
    eventually(|| manager.subscribers() > 0).await;
    assert!(gateway.directory.lookup(WORKSPACE_ID).is_some());

    let mut stopped = running(WORKSPACE_ID, INSTANCE_ID, vec![]);
    stopped.phase = WorkspacePhase::Stopped;
    manager.publish(stopped);
    eventually(|| gateway.directory.lookup(WORKSPACE_ID).is_none()).await;

    let reply = gateway.get(&workspace_host(WORKSPACE_ID), "/", &[]).await;
    assert_eq!(reply.status, StatusCode::FOUND);
}
