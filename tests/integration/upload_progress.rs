//! Upload session behavior: cold start, multi-subscriber progress events,
//! and the all-settled join.

use std::sync::Arc;

use strata::remote::{FilePushStatus, StatusGraph, UploadTicket};
use strata::store::{Action, FileBlob, Store, UploadStatus};
use strata::sync::{SyncCoordinator, UploadEvent, UploadEventKind};
use tokio::sync::broadcast::error::RecvError;

use super::test_utils::ScriptedRemote;

fn file_ok(urls: &[&str], upload_id: Option<&str>) -> FilePushStatus {
    FilePushStatus {
        status_code: 200,
        name: None,
        upload: Some(UploadTicket {
            urls: urls.iter().map(|u| u.to_string()).collect(),
            upload_id: upload_id.map(str::to_string),
            part_size: None,
        }),
    }
}

fn stage_file(store: &Store, node_id: &str, prop: &str) {
    store.dispatch(Action::SetFile {
        layer: "edit".into(),
        node_id: node_id.into(),
        prop: prop.into(),
        filename: format!("{prop}.bin"),
        blob: FileBlob::new("application/octet-stream", vec![0; 64]),
    });
}

async fn drain(mut receiver: tokio::sync::broadcast::Receiver<UploadEvent>) -> Vec<UploadEvent> {
    let mut events = Vec::new();
    loop {
        match receiver.recv().await {
            Ok(event) => events.push(event),
            Err(RecvError::Closed) => break,
            Err(RecvError::Lagged(_)) => continue,
        }
    }
    events
}

#[tokio::test]
async fn one_failing_upload_does_not_cancel_siblings() {
    let store = Arc::new(Store::new());
    stage_file(&store, "n1", "good");
    stage_file(&store, "n1", "bad");

    let mut response = StatusGraph::default();
    let props = response.files.entry("n1".into()).or_default();
    props.insert("good".into(), file_ok(&["https://blobs/ok/1"], None));
    props.insert("bad".into(), file_ok(&["https://blobs/fail/2"], None));

    let remote = ScriptedRemote::new();
    remote.queue_push(Ok(response));
    let coordinator = SyncCoordinator::new(Arc::clone(&store), remote.clone());

    let outcome = coordinator.push("edit").await.unwrap();
    let receiver = outcome.uploads.subscribe();
    let report = outcome.uploads.start().await;

    assert_eq!(report.completed, vec![("n1".to_string(), "good".to_string())]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].1, "bad");
    assert_eq!(remote.upload_count(), 2);

    let events = drain(receiver).await;
    assert!(events
        .iter()
        .any(|e| e.prop == "good" && e.kind == UploadEventKind::Complete));
    assert!(events
        .iter()
        .any(|e| e.prop == "bad" && matches!(e.kind, UploadEventKind::Error(_))));

    store.select(|state| {
        let files = &state["edit"].files["n1"];
        assert_eq!(files["good"].status, UploadStatus::Complete);
        assert!(matches!(files["bad"].status, UploadStatus::Failed(_)));
    });
}

#[tokio::test]
async fn every_subscriber_sees_every_event() {
    let store = Arc::new(Store::new());
    stage_file(&store, "n1", "attachment");

    let mut response = StatusGraph::default();
    response
        .files
        .entry("n1".into())
        .or_default()
        .insert("attachment".into(), file_ok(&["https://blobs/ok/1"], None));

    let remote = ScriptedRemote::new();
    remote.queue_push(Ok(response));
    let coordinator = SyncCoordinator::new(Arc::clone(&store), remote);

    let outcome = coordinator.push("edit").await.unwrap();
    let first = outcome.uploads.subscribe();
    let second = outcome.uploads.subscribe();
    outcome.uploads.start().await;

    let first_events = drain(first).await;
    let second_events = drain(second).await;
    assert_eq!(first_events, second_events);
    assert!(first_events
        .iter()
        .any(|e| matches!(e.kind, UploadEventKind::Progress(_))));
    assert_eq!(
        first_events.last().map(|e| e.kind.clone()),
        Some(UploadEventKind::Complete)
    );
}

#[tokio::test]
async fn progress_fractions_are_monotonic_per_file() {
    let store = Arc::new(Store::new());
    stage_file(&store, "n1", "attachment");

    let mut response = StatusGraph::default();
    response
        .files
        .entry("n1".into())
        .or_default()
        .insert("attachment".into(), file_ok(&["https://blobs/ok/1"], None));

    let remote = ScriptedRemote::new();
    remote.queue_push(Ok(response));
    let coordinator = SyncCoordinator::new(Arc::clone(&store), remote);

    let outcome = coordinator.push("edit").await.unwrap();
    let receiver = outcome.uploads.subscribe();
    outcome.uploads.start().await;

    let fractions: Vec<f64> = drain(receiver)
        .await
        .into_iter()
        .filter_map(|e| match e.kind {
            UploadEventKind::Progress(p) => Some(p),
            _ => None,
        })
        .collect();
    assert!(!fractions.is_empty());
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    assert!(fractions.iter().all(|p| (0.0..=1.0).contains(p)));
}

#[tokio::test]
async fn session_with_no_tasks_settles_immediately() {
    let store = Arc::new(Store::new());
    store.dispatch(Action::SetNode {
        layer: "edit".into(),
        node: strata::Node::new("n1"),
    });

    let remote = ScriptedRemote::new();
    let coordinator = SyncCoordinator::new(Arc::clone(&store), remote);
    let outcome = coordinator.push("edit").await.unwrap();

    assert!(outcome.uploads.is_empty());
    let receiver = outcome.uploads.subscribe();
    let report = outcome.uploads.start().await;
    assert!(report.completed.is_empty() && report.failed.is_empty());
    assert!(drain(receiver).await.is_empty());
}
