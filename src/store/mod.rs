//! Layered store: process-wide layer map, the store handle, and the
//! reducer/stack-resolution submodules.
//!
//! All mutation goes through [`Store::dispatch`]; reads go through
//! [`Store::select`] or the bound convenience reads. The lock is held only
//! for the duration of one reducer application, so a dispatch is atomic with
//! respect to concurrent reads.

pub mod action;
pub mod reducer;
pub mod stack;

pub use action::{Action, MergeSource};
pub use reducer::reduce;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::entity::EntityValue;
use crate::error::StoreError;
use crate::graph::{
    ErrorGraph, FileDescriptor, Graph, Metadata, Node, PresenceLeaves, RightsRecord,
};
use crate::types::{EdgeKind, LayerName, NodeId, Prop};
use crate::view::{select_view, View, ViewResult};

/// Binary payload of a file staged for upload. The descriptor in the graph
/// carries the metadata; the bytes never enter the graph or sync payloads.
#[derive(Clone)]
pub struct FileBlob {
    content_type: String,
    bytes: Arc<[u8]>,
}

impl FileBlob {
    pub fn new(content_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes: bytes.into().into(),
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for FileBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileBlob")
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Upload lifecycle of one staged blob.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadStatus {
    Pending,
    InFlight(f64),
    Complete,
    Failed(String),
}

/// Upload bookkeeping for one `(node, prop)` slot: the staged blob (absent
/// once the staging layer has been cleared) plus its upload status.
#[derive(Debug, Clone)]
pub struct BlobEntry {
    pub blob: Option<FileBlob>,
    pub status: UploadStatus,
}

/// Per-layer blob table, keyed identically to `graph.files`.
pub type BlobTable = HashMap<NodeId, HashMap<Prop, BlobEntry>>;

/// One named layer: its graph, staged blobs, error channel, and variables.
#[derive(Debug, Clone, Default)]
pub struct GraphLayer {
    pub graph: Graph,
    pub files: BlobTable,
    pub errors: ErrorGraph,
    pub vars: HashMap<String, Value>,
}

/// The process-wide state: layer name to layer, created lazily on first
/// write.
pub type LayerMap = HashMap<LayerName, GraphLayer>;

/// Shared handle over the layer map. Cheap to clone via `Arc` at the
/// embedding site; all mutation funnels through the reducer.
#[derive(Default)]
pub struct Store {
    state: RwLock<LayerMap>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one action atomically.
    pub fn dispatch(&self, action: Action) {
        tracing::debug!(action = action.kind(), "dispatch");
        let mut state = self.state.write();
        reduce(&mut state, action);
    }

    /// Run a read closure against the current state.
    pub fn select<T>(&self, f: impl FnOnce(&LayerMap) -> T) -> T {
        f(&self.state.read())
    }

    /// Resolve one node across a layer stack.
    pub fn node(&self, stack: &[&str], id: &str) -> EntityValue<Node> {
        self.select(|state| stack::select_node(stack, id, state))
    }

    /// Resolve the connected set of one `(edge kind, from node)` pair.
    ///
    /// The edge kind is given in `"FromType/ToType"` form and validated
    /// before any read.
    pub fn edge(
        &self,
        stack: &[&str],
        edge_types: &str,
        from_id: &str,
    ) -> Result<HashMap<NodeId, EntityValue<Metadata>>, StoreError> {
        let kind = EdgeKind::parse(edge_types)?;
        require_stack(stack)?;
        Ok(self.select(|state| stack::select_edge(stack, &kind, from_id, state)))
    }

    /// Resolve the reverse-index-derived set of one `(edge kind, to node)`
    /// pair.
    pub fn reverse_edge(
        &self,
        stack: &[&str],
        edge_types: &str,
        to_id: &str,
    ) -> Result<PresenceLeaves, StoreError> {
        let kind = EdgeKind::parse(edge_types)?;
        require_stack(stack)?;
        Ok(self.select(|state| stack::select_reverse_edge(stack, &kind, to_id, state)))
    }

    /// Resolve the metadata of one specific connection.
    pub fn metadata(
        &self,
        stack: &[&str],
        edge_types: &str,
        from_id: &str,
        to_id: &str,
    ) -> Result<EntityValue<Metadata>, StoreError> {
        let kind = EdgeKind::parse(edge_types)?;
        require_stack(stack)?;
        Ok(self.select(|state| stack::select_metadata(stack, &kind, from_id, to_id, state)))
    }

    /// Resolve the rights record of one node.
    pub fn rights(&self, stack: &[&str], node_id: &str) -> EntityValue<RightsRecord> {
        self.select(|state| stack::select_rights(stack, node_id, state))
    }

    /// Resolve the file descriptors of one node.
    pub fn files(&self, stack: &[&str], node_id: &str) -> HashMap<Prop, FileDescriptor> {
        self.select(|state| stack::select_files(stack, node_id, state))
    }

    /// Resolve one layer variable (most specific layer wins).
    pub fn var(&self, stack: &[&str], name: &str) -> Option<Value> {
        self.select(|state| stack::select_var(stack, name, state))
    }

    /// Materialize a view against a layer stack.
    pub fn view(&self, stack: &[&str], view: &View) -> ViewResult {
        self.select(|state| select_view(stack, view, state))
    }
}

fn require_stack(stack: &[&str]) -> Result<(), StoreError> {
    if stack.is_empty() {
        return Err(StoreError::MissingParam("stack"));
    }
    Ok(())
}
