//! Typed mutation actions applied by the reducer.

use serde_json::Value;

use crate::entity::EntityValue;
use crate::graph::{ErrorGraph, Graph, Metadata, Node, RightsBits};
use crate::store::FileBlob;
use crate::types::{EdgeKind, Email, LayerName, NodeId, Prop, Role};

/// Source side of a [`Action::Merge`]: either another named layer or a
/// free-standing graph (e.g. a push success partition).
#[derive(Debug, Clone)]
pub enum MergeSource {
    Layer(LayerName),
    Graph(Graph),
}

/// The full mutation vocabulary of the store.
///
/// Every edge-touching action pairs its forward write with the matching
/// reverse-index write in the same transition; no action updates one side
/// without the other.
#[derive(Debug, Clone)]
pub enum Action {
    /// Combine-merge a node record into `nodes[id]`.
    SetNode { layer: LayerName, node: Node },

    /// Merge the target node and connect it: node body, forward edge leaf,
    /// and reverse-index marker in one transition.
    Add {
        layer: LayerName,
        kind: EdgeKind,
        from_id: NodeId,
        to_node: Node,
        metadata: EntityValue<Metadata>,
    },

    /// Connect an existing node without touching `nodes`.
    Assoc {
        layer: LayerName,
        kind: EdgeKind,
        from_id: NodeId,
        to_id: NodeId,
        metadata: EntityValue<Metadata>,
    },

    /// Tombstone the target node, the forward edge leaf, and the
    /// reverse-index leaf.
    Remove {
        layer: LayerName,
        kind: EdgeKind,
        from_id: NodeId,
        to_id: NodeId,
    },

    /// Tombstone the connection only, leaving `nodes` untouched.
    Dissoc {
        layer: LayerName,
        kind: EdgeKind,
        from_id: NodeId,
        to_id: NodeId,
    },

    /// Shallow-merge capability bits into `rights[node_id].user[email]`.
    SetRights {
        layer: LayerName,
        node_id: NodeId,
        email: Email,
        rights: RightsBits,
    },

    /// Shallow-merge capability bits into `rights[node_id].role[role]`.
    SetRoleRights {
        layer: LayerName,
        node_id: NodeId,
        role: Role,
        rights: RightsBits,
    },

    /// Point `rights[node_id].inherit` at another node.
    InheritRights {
        layer: LayerName,
        node_id: NodeId,
        from: NodeId,
    },

    /// Record a file descriptor in the graph and stash the blob in the
    /// layer's blob table.
    SetFile {
        layer: LayerName,
        node_id: NodeId,
        prop: Prop,
        filename: String,
        blob: FileBlob,
    },

    /// Tombstone the descriptor and drop the blob.
    RemoveFile {
        layer: LayerName,
        node_id: NodeId,
        prop: Prop,
    },

    /// Plain overwrite of a layer variable (no tri-state rule).
    SetVar {
        layer: LayerName,
        name: String,
        value: Value,
    },

    /// Overlay Merge a source graph (or layer) into the target layer.
    Merge {
        source: MergeSource,
        target: LayerName,
    },

    /// Overlay Merge per-item failures into the target layer's error channel.
    MergeError {
        errors: ErrorGraph,
        target: LayerName,
    },

    /// Replace Merge remote truth into the target layer.
    MergeOverwrite { graph: Graph, target: LayerName },

    /// Destroy one layer.
    Clear { layer: LayerName },

    /// Reset the entire process state.
    ClearAll,

    /// Record upload progress for one `(node, prop)` blob.
    UploadProgress {
        layer: LayerName,
        node_id: NodeId,
        prop: Prop,
        progress: f64,
    },

    /// Record upload completion for one `(node, prop)` blob.
    UploadComplete {
        layer: LayerName,
        node_id: NodeId,
        prop: Prop,
    },

    /// Record upload failure for one `(node, prop)` blob.
    UploadError {
        layer: LayerName,
        node_id: NodeId,
        prop: Prop,
        message: String,
    },
}

impl Action {
    /// Short action name for trace output.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::SetNode { .. } => "set_node",
            Action::Add { .. } => "add",
            Action::Assoc { .. } => "assoc",
            Action::Remove { .. } => "remove",
            Action::Dissoc { .. } => "dissoc",
            Action::SetRights { .. } => "set_rights",
            Action::SetRoleRights { .. } => "set_role_rights",
            Action::InheritRights { .. } => "inherit_rights",
            Action::SetFile { .. } => "set_file",
            Action::RemoveFile { .. } => "remove_file",
            Action::SetVar { .. } => "set_var",
            Action::Merge { .. } => "merge",
            Action::MergeError { .. } => "merge_error",
            Action::MergeOverwrite { .. } => "merge_overwrite",
            Action::Clear { .. } => "clear",
            Action::ClearAll => "clear_all",
            Action::UploadProgress { .. } => "upload_progress",
            Action::UploadComplete { .. } => "upload_complete",
            Action::UploadError { .. } => "upload_error",
        }
    }
}
