//! Concurrent per-file upload sessions with a cold, multi-subscriber
//! progress channel.
//!
//! A session is built by `push` but does nothing until [`UploadSession::start`]
//! is called. One task runs per `(node, prop)`; a failing upload never
//! cancels its siblings, and the event channel closes only after every task
//! has settled.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::broadcast;

use crate::remote::{ProgressFn, RemoteApi, UploadRequest, UploadTicket};
use crate::store::{Action, FileBlob, Store};
use crate::types::{LayerName, NodeId, Prop};

/// What happened to one file at one moment.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEventKind {
    /// Fraction of the blob transferred, `0.0..=1.0`.
    Progress(f64),
    Complete,
    Error(String),
}

/// One event on the progress channel.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadEvent {
    pub node_id: NodeId,
    pub prop: Prop,
    pub kind: UploadEventKind,
    pub at: DateTime<Utc>,
}

impl UploadEvent {
    fn now(node_id: &str, prop: &str, kind: UploadEventKind) -> Self {
        Self {
            node_id: node_id.to_string(),
            prop: prop.to_string(),
            kind,
            at: Utc::now(),
        }
    }
}

/// One pending upload: coordinates from the push response plus the staged
/// blob captured before the draft layer was cleared.
#[derive(Debug, Clone)]
pub(crate) struct UploadTask {
    pub node_id: NodeId,
    pub prop: Prop,
    pub ticket: UploadTicket,
    pub blob: FileBlob,
}

/// Settled outcomes after every task has finished.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub completed: Vec<(NodeId, Prop)>,
    pub failed: Vec<(NodeId, Prop, String)>,
}

/// A cold batch of uploads. Subscribe first, then [`start`](Self::start).
pub struct UploadSession {
    layer: LayerName,
    tasks: Vec<UploadTask>,
    store: Arc<Store>,
    remote: Arc<dyn RemoteApi>,
    default_part_size: u64,
    events: broadcast::Sender<UploadEvent>,
}

const EVENT_CHANNEL_CAPACITY: usize = 256;

impl UploadSession {
    pub(crate) fn new(
        layer: LayerName,
        tasks: Vec<UploadTask>,
        store: Arc<Store>,
        remote: Arc<dyn RemoteApi>,
        default_part_size: u64,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            layer,
            tasks,
            store,
            remote,
            default_part_size,
            events,
        }
    }

    /// Subscribe to progress events. The channel closes once every task has
    /// settled.
    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.events.subscribe()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every upload concurrently and resolve once all of them have
    /// settled. A single failing upload does not cancel its siblings.
    pub async fn start(self) -> UploadReport {
        let Self {
            layer,
            tasks,
            store,
            remote,
            default_part_size,
            events,
        } = self;

        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let layer = layer.clone();
                let store = Arc::clone(&store);
                let remote = Arc::clone(&remote);
                let events = events.clone();
                tokio::spawn(run_task(task, layer, store, remote, events, default_part_size))
            })
            .collect();

        let mut report = UploadReport::default();
        for settled in join_all(handles).await {
            match settled {
                Ok(Ok((node_id, prop))) => report.completed.push((node_id, prop)),
                Ok(Err((node_id, prop, reason))) => report.failed.push((node_id, prop, reason)),
                Err(join_error) => {
                    tracing::error!(%join_error, "upload task aborted");
                }
            }
        }
        // `events` drops here; subscribers observe channel closure as the
        // all-settled signal.
        report
    }
}

type TaskOutcome = Result<(NodeId, Prop), (NodeId, Prop, String)>;

async fn run_task(
    task: UploadTask,
    layer: LayerName,
    store: Arc<Store>,
    remote: Arc<dyn RemoteApi>,
    events: broadcast::Sender<UploadEvent>,
    default_part_size: u64,
) -> TaskOutcome {
    let UploadTask {
        node_id,
        prop,
        ticket,
        blob,
    } = task;

    let on_progress: ProgressFn = {
        let node_id = node_id.clone();
        let prop = prop.clone();
        let layer = layer.clone();
        let store = Arc::clone(&store);
        let events = events.clone();
        Arc::new(move |progress| {
            let _ = events.send(UploadEvent::now(
                &node_id,
                &prop,
                UploadEventKind::Progress(progress),
            ));
            store.dispatch(Action::UploadProgress {
                layer: layer.clone(),
                node_id: node_id.clone(),
                prop: prop.clone(),
                progress,
            });
        })
    };

    let request = UploadRequest {
        urls: ticket.urls,
        blob,
        upload_id: ticket.upload_id,
        part_size: ticket.part_size.or(Some(default_part_size)),
        on_progress: Some(on_progress),
    };

    match remote.upload(request).await {
        Ok(()) => {
            let _ = events.send(UploadEvent::now(&node_id, &prop, UploadEventKind::Complete));
            store.dispatch(Action::UploadComplete {
                layer,
                node_id: node_id.clone(),
                prop: prop.clone(),
            });
            Ok((node_id, prop))
        }
        Err(error) => {
            let reason = error.to_string();
            tracing::error!(%node_id, %prop, %error, "file upload failed");
            let _ = events.send(UploadEvent::now(
                &node_id,
                &prop,
                UploadEventKind::Error(reason.clone()),
            ));
            store.dispatch(Action::UploadError {
                layer,
                node_id: node_id.clone(),
                prop: prop.clone(),
                message: reason.clone(),
            });
            Err((node_id, prop, reason))
        }
    }
}
