//! Sync coordinator: reconcile local drafts against the remote push/pull
//! API.
//!
//! `push` is all-or-nothing at the transport level — a failed remote call
//! dispatches nothing — while per-item failures inside a successful response
//! are data, partitioned into the draft layer's error channel. `pull`
//! reconciles by clearing every path the view currently resolves and
//! replace-merging remote truth over the clearing marks.
//!
//! Concurrent pushes of *different* draft layers do not interfere; two
//! concurrent pushes of the same draft layer race, and callers must
//! serialize per layer.

pub mod upload;

pub use upload::{UploadEvent, UploadEventKind, UploadReport, UploadSession};

use std::sync::Arc;

use crate::config::UploadConfig;
use crate::error::StoreError;
use crate::graph::{ErrorGraph, Graph, Rejection};
use crate::merge::merge_graphs_right;
use crate::remote::{RemoteApi, StatusGraph};
use crate::store::{Action, BlobTable, MergeSource, Store};
use crate::types::EdgeKind;
use crate::view::{pick_graph, PickMode, View};
use upload::UploadTask;

/// Layer that push success partitions and pulls land in by default.
pub const DEFAULT_TARGET_LAYER: &str = "main";

/// Result of a successful push: the two partitions plus the cold upload
/// session for accepted file descriptors.
pub struct PushOutcome {
    pub success: Graph,
    pub errors: ErrorGraph,
    pub uploads: UploadSession,
}

/// Orchestrates push and pull for one store against one remote.
pub struct SyncCoordinator {
    store: Arc<Store>,
    remote: Arc<dyn RemoteApi>,
    upload: UploadConfig,
}

impl SyncCoordinator {
    pub fn new(store: Arc<Store>, remote: Arc<dyn RemoteApi>) -> Self {
        Self::with_upload_config(store, remote, UploadConfig::default())
    }

    pub fn with_upload_config(
        store: Arc<Store>,
        remote: Arc<dyn RemoteApi>,
        upload: UploadConfig,
    ) -> Self {
        Self {
            store,
            remote,
            upload,
        }
    }

    /// Push a draft layer to the default target layer.
    pub async fn push(&self, draft_layer: &str) -> Result<PushOutcome, StoreError> {
        self.push_to(draft_layer, DEFAULT_TARGET_LAYER).await
    }

    /// Push a draft layer: send the index-stripped draft graph, partition
    /// the per-item response, merge the success partition into the target,
    /// clear the draft, and route per-item failures into the draft layer's
    /// error channel. Uploads for accepted file descriptors are returned
    /// cold; nothing transfers until the caller starts the session.
    pub async fn push_to(
        &self,
        draft_layer: &str,
        target_layer: &str,
    ) -> Result<PushOutcome, StoreError> {
        if draft_layer.is_empty() {
            return Err(StoreError::MissingParam("draft_layer"));
        }

        let (draft_graph, staged_blobs) = self.store.select(|state| {
            state
                .get(draft_layer)
                .map(|layer| (layer.graph.clone(), layer.files.clone()))
                .unwrap_or_default()
        });

        let payload = draft_graph.without_index();
        let status = match self.remote.push(&payload).await {
            Ok(status) => status,
            Err(error) => {
                tracing::error!(draft_layer, %error, "push failed; state unchanged");
                return Err(error.into());
            }
        };

        let (success, errors, tasks) = partition(&draft_graph, &staged_blobs, &status);
        tracing::info!(
            draft_layer,
            target_layer,
            accepted = success.nodes.len(),
            rejected = errors.nodes.len(),
            uploads = tasks.len(),
            "push partitioned"
        );

        self.store.dispatch(Action::Merge {
            source: MergeSource::Graph(success.clone()),
            target: target_layer.to_string(),
        });
        self.store.dispatch(Action::Clear {
            layer: draft_layer.to_string(),
        });
        if !errors.is_empty() {
            self.store.dispatch(Action::MergeError {
                errors: errors.clone(),
                target: draft_layer.to_string(),
            });
        }

        let uploads = UploadSession::new(
            draft_layer.to_string(),
            tasks,
            Arc::clone(&self.store),
            Arc::clone(&self.remote),
            self.upload.part_size,
        );

        Ok(PushOutcome {
            success,
            errors,
            uploads,
        })
    }

    /// Pull a view into the default target layer.
    pub async fn pull(&self, view: &View) -> Result<Graph, StoreError> {
        self.pull_to(view, DEFAULT_TARGET_LAYER).await
    }

    /// Pull: clear-mark every path the view currently resolves in the
    /// target layer, overlay remote truth over the clearing marks (remote
    /// wins where both speak), and replace-merge the result so paths the
    /// server did not re-confirm are hard-deleted. Returns the raw remote
    /// graph.
    pub async fn pull_to(&self, view: &View, target_layer: &str) -> Result<Graph, StoreError> {
        if view.is_empty() {
            tracing::warn!(target_layer, "pull called with an empty view; nothing to do");
            return Ok(Graph::default());
        }

        let clearing = self.store.select(|state| {
            state
                .get(target_layer)
                .map(|layer| pick_graph(view, &layer.graph, PickMode::Clear))
                .unwrap_or_default()
        });

        let remote_graph = match self.remote.pull(view).await {
            Ok(graph) => graph,
            Err(error) => {
                tracing::error!(target_layer, %error, "pull failed; state unchanged");
                return Err(error.into());
            }
        };

        let from_graph = merge_graphs_right(&clearing, &remote_graph);
        self.store.dispatch(Action::MergeOverwrite {
            graph: from_graph,
            target: target_layer.to_string(),
        });

        Ok(remote_graph)
    }
}

/// Split a status response into success and error partitions, mirroring the
/// draft's reverse-index leaves alongside their edges and collecting upload
/// tasks for accepted file descriptors.
fn partition(
    draft: &Graph,
    staged_blobs: &BlobTable,
    status: &StatusGraph,
) -> (Graph, ErrorGraph, Vec<UploadTask>) {
    let mut success = Graph::default();
    let mut errors = ErrorGraph::default();
    let mut tasks = Vec::new();

    for (node_id, leaf) in &status.nodes {
        let original = draft.nodes.get(node_id).cloned().unwrap_or_default();
        if leaf.ok() {
            success.nodes.insert(node_id.clone(), original);
        } else {
            errors.nodes.insert(
                node_id.clone(),
                Rejection {
                    status_code: leaf.status_code,
                    name: leaf.name.clone(),
                    element: original,
                },
            );
        }
    }

    for (node_id, leaf) in &status.rights {
        let original = draft.rights.get(node_id).cloned().unwrap_or_default();
        if leaf.ok() {
            success.rights.insert(node_id.clone(), original);
        } else {
            errors.rights.insert(
                node_id.clone(),
                Rejection {
                    status_code: leaf.status_code,
                    name: leaf.name.clone(),
                    element: original,
                },
            );
        }
    }

    for (from_type, from_ids) in &status.edges {
        for (from_id, to_types) in from_ids {
            for (to_type, to_ids) in to_types {
                let kind = EdgeKind::new(from_type.clone(), to_type.clone());
                for (to_id, leaf) in to_ids {
                    let original = draft
                        .edge(&kind, from_id, to_id)
                        .cloned()
                        .unwrap_or_default();
                    // The reverse leaf is derived locally from the edge
                    // coordinates, never received from the server.
                    let reverse = draft.reverse_edge(&kind, to_id, from_id).cloned();
                    if leaf.ok() {
                        success.set_edge(&kind, from_id, to_id, original);
                        if let Some(presence) = reverse {
                            success.set_reverse_edge(&kind, to_id, from_id, presence);
                        }
                    } else {
                        errors.set_edge(
                            &kind,
                            from_id,
                            to_id,
                            Rejection {
                                status_code: leaf.status_code,
                                name: leaf.name.clone(),
                                element: original,
                            },
                        );
                        if let Some(presence) = reverse {
                            errors.set_reverse_edge(
                                &kind,
                                to_id,
                                from_id,
                                Rejection {
                                    status_code: leaf.status_code,
                                    name: leaf.name.clone(),
                                    element: presence,
                                },
                            );
                        }
                    }
                }
            }
        }
    }

    for (node_id, props) in &status.files {
        for (prop, leaf) in props {
            let original = draft.file(node_id, prop).cloned().unwrap_or_default();
            if leaf.ok() {
                success.set_file(node_id, prop, original);
                if let Some(ticket) = &leaf.upload {
                    let blob = staged_blobs
                        .get(node_id)
                        .and_then(|props| props.get(prop))
                        .and_then(|entry| entry.blob.clone());
                    match blob {
                        Some(blob) => tasks.push(UploadTask {
                            node_id: node_id.clone(),
                            prop: prop.clone(),
                            ticket: ticket.clone(),
                            blob,
                        }),
                        None => {
                            tracing::warn!(%node_id, %prop, "upload ticket without a staged blob")
                        }
                    }
                }
            } else {
                errors
                    .files
                    .entry(node_id.clone())
                    .or_default()
                    .insert(
                        prop.clone(),
                        Rejection {
                            status_code: leaf.status_code,
                            name: leaf.name.clone(),
                            element: original,
                        },
                    );
            }
        }
    }

    (success, errors, tasks)
}
