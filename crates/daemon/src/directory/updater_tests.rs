// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::orchestrator::FakeOrchestrator;
use crate::test_support::{eventually, status};
use wsp_core::WorkspacePhase;

struct Harness {
    orchestrator: Arc<FakeOrchestrator>,
    directory: Arc<Directory>,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

fn start(orchestrator: Arc<FakeOrchestrator>) -> Harness {
    let directory = Directory::new();
    let shutdown = CancellationToken::new();
    let updater = Updater::new(orchestrator.clone(), Arc::clone(&directory), Duration::from_millis(10));
    let handle = updater.spawn(shutdown.clone());
    Harness { orchestrator, directory, shutdown, handle }
}

#[tokio::test]
async fn syncs_snapshot_then_applies_events() {
    let orchestrator = Arc::new(FakeOrchestrator::new());
    orchestrator.set_snapshot(vec![status("w1", "i1", WorkspacePhase::Running)]);
    let events = orchestrator.push_stream();
    let h = start(orchestrator);

    eventually(|| h.directory.is_ready()).await;
    assert!(h.directory.lookup("w1").is_some());

    events.send(Ok(SubscribeEvent::status(status("w2", "i2", WorkspacePhase::Initializing)))).unwrap();
    eventually(|| h.directory.lookup("w2").is_some()).await;

    events.send(Ok(SubscribeEvent::status(status("w1", "i1", WorkspacePhase::Stopped)))).unwrap();
    eventually(|| h.directory.lookup("w1").is_none()).await;

    h.shutdown.cancel();
    h.handle.await.unwrap();
    assert!(!h.directory.is_ready());
}

#[tokio::test]
async fn stopped_event_for_other_instance_is_ignored() {
    let orchestrator = Arc::new(FakeOrchestrator::new());
    orchestrator.set_snapshot(vec![status("w1", "current", WorkspacePhase::Running)]);
    let events = orchestrator.push_stream();
    let h = start(orchestrator);
    eventually(|| h.directory.is_ready()).await;

    events.send(Ok(SubscribeEvent::status(status("w1", "previous", WorkspacePhase::Stopped)))).unwrap();
    events.send(Ok(SubscribeEvent::status(status("w9", "marker", WorkspacePhase::Running)))).unwrap();
    eventually(|| h.directory.lookup("w9").is_some()).await;
    assert_eq!(h.directory.lookup("w1").map(|i| i.instance_id.to_string()), Some("current".into()));
    h.shutdown.cancel();
}

#[tokio::test]
async fn log_only_events_are_skipped() {
    let orchestrator = Arc::new(FakeOrchestrator::new());
    let events = orchestrator.push_stream();
    let h = start(orchestrator);
    eventually(|| h.directory.is_ready()).await;

    events.send(Ok(SubscribeEvent::default())).unwrap();
    events.send(Ok(SubscribeEvent::status(status("w1", "i1", WorkspacePhase::Running)))).unwrap();
    eventually(|| h.directory.lookup("w1").is_some()).await;
    assert_eq!(h.directory.len(), 1);
    h.shutdown.cancel();
}

#[tokio::test]
async fn reconnects_and_resyncs_after_stream_end() {
    let orchestrator = Arc::new(FakeOrchestrator::new());
    orchestrator.set_snapshot(vec![status("w1", "i1", WorkspacePhase::Running)]);
    let first = orchestrator.push_stream();
    let h = start(Arc::clone(&orchestrator));
    eventually(|| h.directory.is_ready()).await;

    orchestrator.set_snapshot(vec![status("w2", "i2", WorkspacePhase::Running)]);
    let _second = orchestrator.push_stream();
    drop(first);

    eventually(|| h.directory.lookup("w2").is_some()).await;
    assert!(h.directory.lookup("w1").is_none());
    assert!(h.directory.is_ready());
    assert_eq!(h.orchestrator.subscribe_calls(), 2);
    h.shutdown.cancel();
}

#[tokio::test]
async fn stream_error_marks_not_ready_and_retries() {
    let orchestrator = Arc::new(FakeOrchestrator::new());
    let first = orchestrator.push_stream();
    let h = start(Arc::clone(&orchestrator));
    eventually(|| h.directory.is_ready()).await;

    first.send(Err(OrchestratorError::Stream("reset".into()))).unwrap();
    eventually(|| !h.directory.is_ready()).await;
    eventually(|| h.orchestrator.subscribe_calls() >= 2).await;

    let _second = orchestrator.push_stream();
    eventually(|| h.directory.is_ready()).await;
    h.shutdown.cancel();
}

#[tokio::test]
async fn snapshot_failure_keeps_directory_not_ready() {
    let orchestrator = Arc::new(FakeOrchestrator::new());
    orchestrator.fail_snapshot(true);
    let _events = orchestrator.push_stream();
    let h = start(Arc::clone(&orchestrator));

    eventually(|| h.orchestrator.subscribe_calls() >= 2).await;
    assert!(!h.directory.is_ready());
    h.shutdown.cancel();
    h.handle.await.unwrap();
}

#[tokio::test]
async fn shutdown_reports_stopped_state() {
    let orchestrator = Arc::new(FakeOrchestrator::new());
    let _events = orchestrator.push_stream();
    let updater = Updater::new(orchestrator, Directory::new(), Duration::from_millis(10));
    let state = updater.state();
    let shutdown = CancellationToken::new();
    let handle = updater.spawn(shutdown.clone());

    shutdown.cancel();
    handle.await.unwrap();
    assert_eq!(*state.borrow(), UpdaterState::Stopped);
}
