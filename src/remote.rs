//! Remote synchronization API.
//!
//! Unified interface for the push/pull/upload collaborator. The store never
//! talks HTTP directly; it goes through [`RemoteApi`], with [`HttpRemote`]
//! as the production implementation. The wire-level protocol beyond these
//! shapes is the remote's concern.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::RemoteConfig;
use crate::error::{RemoteError, StoreError};
use crate::graph::Graph;
use crate::store::FileBlob;
use crate::types::{NodeId, Prop, TypeName};
use crate::view::View;

/// Per-item outcome of a pushed graph leaf, mirroring the draft's path
/// shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushStatus {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PushStatus {
    pub fn ok(&self) -> bool {
        self.status_code == 200
    }
}

/// Upload coordinates returned for an accepted file descriptor: one URL and
/// no upload id means single-part, anything else is multi-part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTicket {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_size: Option<u64>,
}

impl UploadTicket {
    pub fn is_multipart(&self) -> bool {
        self.urls.len() > 1 || self.upload_id.is_some()
    }
}

/// Push outcome of one file descriptor leaf, with upload coordinates on
/// acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePushStatus {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadTicket>,
}

impl FilePushStatus {
    pub fn ok(&self) -> bool {
        self.status_code == 200
    }
}

/// Remote push response: `PushStatus` leaves in the draft's path shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusGraph {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub nodes: HashMap<NodeId, PushStatus>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub edges: HashMap<TypeName, HashMap<NodeId, HashMap<TypeName, HashMap<NodeId, PushStatus>>>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub rights: HashMap<NodeId, PushStatus>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub files: HashMap<NodeId, HashMap<Prop, FilePushStatus>>,
}

/// Progress callback for one upload, `0.0..=1.0`.
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// One upload request: coordinates from the push response plus the staged
/// blob.
#[derive(Clone)]
pub struct UploadRequest {
    pub urls: Vec<String>,
    pub blob: FileBlob,
    pub upload_id: Option<String>,
    pub part_size: Option<u64>,
    pub on_progress: Option<ProgressFn>,
}

impl UploadRequest {
    fn progress(&self, value: f64) {
        if let Some(on_progress) = &self.on_progress {
            on_progress(value);
        }
    }
}

/// The consumed remote collaborator contract.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Push a draft graph; the response mirrors the draft's path shape with
    /// per-item status leaves.
    async fn push(&self, graph: &Graph) -> Result<StatusGraph, RemoteError>;

    /// Pull the sub-graph a view addresses.
    async fn pull(&self, view: &View) -> Result<Graph, RemoteError>;

    /// Upload one blob to the given coordinates.
    async fn upload(&self, request: UploadRequest) -> Result<(), RemoteError>;
}

const DEFAULT_PART_SIZE: u64 = 5 * 1024 * 1024;

/// HTTP implementation of [`RemoteApi`].
pub struct HttpRemote {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRemote {
    pub fn new(config: &RemoteConfig) -> Result<Self, StoreError> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| StoreError::Configuration("remote.endpoint is not set".to_string()))?;
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                StoreError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }
        builder
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(match status.as_u16() {
            401 | 403 => RemoteError::AuthFailed(body),
            404 => RemoteError::NotFound(body),
            429 => RemoteError::RateLimit(body),
            _ => RemoteError::RequestFailed(format!("status {}: {}", status, body)),
        })
    }
}

/// Map transport-level reqwest failures onto the remote error taxonomy.
fn map_http_error(error: reqwest::Error) -> RemoteError {
    if error.is_timeout() {
        RemoteError::RequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        RemoteError::RequestFailed(format!("Connection error: {}", error))
    } else {
        RemoteError::RequestFailed(format!("HTTP error: {}", error))
    }
}

#[async_trait]
impl RemoteApi for HttpRemote {
    async fn push(&self, graph: &Graph) -> Result<StatusGraph, RemoteError> {
        let url = format!("{}/push", self.base_url);
        let response = self
            .request(reqwest::Method::POST, &url)
            .json(graph)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::MalformedResponse(format!("push response: {}", e)))
    }

    async fn pull(&self, view: &View) -> Result<Graph, RemoteError> {
        let url = format!("{}/pull", self.base_url);
        let response = self
            .request(reqwest::Method::POST, &url)
            .json(view)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::MalformedResponse(format!("pull response: {}", e)))
    }

    async fn upload(&self, request: UploadRequest) -> Result<(), RemoteError> {
        if request.urls.is_empty() {
            return Err(RemoteError::RequestFailed(
                "upload requires at least one URL".to_string(),
            ));
        }

        let single_part = request.urls.len() == 1 && request.upload_id.is_none();
        if single_part {
            let response = self
                .client
                .put(&request.urls[0])
                .header("Content-Type", request.blob.content_type())
                .body(request.blob.bytes().to_vec())
                .send()
                .await
                .map_err(map_http_error)?;
            Self::check_status(response).await?;
            request.progress(1.0);
            return Ok(());
        }

        let part_size = request.part_size.unwrap_or(DEFAULT_PART_SIZE).max(1) as usize;
        let parts: Vec<&[u8]> = request.blob.bytes().chunks(part_size).collect();
        let total = parts.len().min(request.urls.len());
        for (index, (url, part)) in request.urls.iter().zip(parts).enumerate() {
            let mut builder = self
                .client
                .put(url)
                .header("Content-Type", request.blob.content_type());
            if let Some(upload_id) = &request.upload_id {
                builder = builder.header("x-upload-id", upload_id);
            }
            let response = builder
                .body(part.to_vec())
                .send()
                .await
                .map_err(map_http_error)?;
            Self::check_status(response).await?;
            request.progress((index + 1) as f64 / total as f64);
        }
        Ok(())
    }
}
