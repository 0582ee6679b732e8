//! Shared helpers for integration tests: a scriptable remote and small
//! graph constructors.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use strata::error::RemoteError;
use strata::graph::Metadata;
use strata::remote::{RemoteApi, StatusGraph, UploadRequest};
use strata::view::View;
use strata::Graph;

/// Scriptable remote: queued push/pull responses, recorded requests, and
/// uploads that fail when the first URL contains `"fail"`.
pub struct ScriptedRemote {
    push_responses: Mutex<Vec<Result<StatusGraph, RemoteError>>>,
    pull_responses: Mutex<Vec<Result<Graph, RemoteError>>>,
    pub pushed: Mutex<Vec<Graph>>,
    pub uploaded: Mutex<Vec<(Vec<String>, u64)>>,
}

impl ScriptedRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            push_responses: Mutex::new(Vec::new()),
            pull_responses: Mutex::new(Vec::new()),
            pushed: Mutex::new(Vec::new()),
            uploaded: Mutex::new(Vec::new()),
        })
    }

    pub fn queue_push(&self, response: Result<StatusGraph, RemoteError>) {
        self.push_responses.lock().unwrap().push(response);
    }

    pub fn queue_pull(&self, response: Result<Graph, RemoteError>) {
        self.pull_responses.lock().unwrap().push(response);
    }

    pub fn upload_count(&self) -> usize {
        self.uploaded.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteApi for ScriptedRemote {
    async fn push(&self, graph: &Graph) -> Result<StatusGraph, RemoteError> {
        self.pushed.lock().unwrap().push(graph.clone());
        let mut queued = self.push_responses.lock().unwrap();
        if queued.is_empty() {
            Ok(StatusGraph::default())
        } else {
            queued.remove(0)
        }
    }

    async fn pull(&self, _view: &View) -> Result<Graph, RemoteError> {
        let mut queued = self.pull_responses.lock().unwrap();
        if queued.is_empty() {
            Ok(Graph::default())
        } else {
            queued.remove(0)
        }
    }

    async fn upload(&self, request: UploadRequest) -> Result<(), RemoteError> {
        self.uploaded
            .lock()
            .unwrap()
            .push((request.urls.clone(), request.blob.size()));

        if let Some(on_progress) = &request.on_progress {
            on_progress(0.5);
        }
        if request.urls.first().is_some_and(|url| url.contains("fail")) {
            return Err(RemoteError::RequestFailed("scripted failure".to_string()));
        }
        if let Some(on_progress) = &request.on_progress {
            on_progress(1.0);
        }
        Ok(())
    }
}

pub fn meta(pairs: &[(&str, Value)]) -> Metadata {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
