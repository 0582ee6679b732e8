//! Graph data model: nodes, the depth-4 edge index, rights, file
//! descriptors, and the derived reverse edge index.
//!
//! All shapes are fixed and depth-bounded, so access goes through typed
//! accessors per entity kind rather than a generic path walker.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{EntityValue, Overlay};
use crate::types::{EdgeKind, Email, NodeId, Prop, Role, TypeName};

/// Arbitrary record attached to an edge instance (or to a node body).
pub type Metadata = serde_json::Map<String, Value>;

/// `to_id -> metadata` leaves of one `(from_type, from_id, to_type)` cell.
pub type EdgeLeaves = HashMap<NodeId, EntityValue<Metadata>>;

/// Forward edge index: `from_type -> from_id -> to_type -> to_id -> leaf`.
pub type EdgeMap = HashMap<TypeName, HashMap<NodeId, HashMap<TypeName, EdgeLeaves>>>;

/// `from_id -> presence` leaves of one `(to_type, to_id, from_type)` cell.
pub type PresenceLeaves = HashMap<NodeId, EntityValue<()>>;

/// Reverse edge index: `to_type -> to_id -> from_type -> from_id -> presence`.
pub type ReverseEdgeMap = HashMap<TypeName, HashMap<NodeId, HashMap<TypeName, PresenceLeaves>>>;

/// File descriptors per node: `node_id -> prop -> descriptor`.
pub type FileMap = HashMap<NodeId, HashMap<Prop, EntityValue<FileDescriptor>>>;

/// A graph node: mandatory `id` plus an open record of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(flatten)]
    pub fields: Metadata,
}

impl Node {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            fields: Metadata::new(),
        }
    }

    /// Attach a field, builder-style.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl Overlay for Node {
    fn overlay(&self, incoming: &Self) -> Self {
        Node {
            id: incoming.id.clone(),
            fields: self.fields.overlay(&incoming.fields),
        }
    }
}

/// Capability flags granted to a user or role.
///
/// Fields not present in an incoming record leave the existing grant
/// untouched; present fields overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RightsBits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
}

impl RightsBits {
    pub fn read_write() -> Self {
        Self {
            read: Some(true),
            write: Some(true),
            admin: None,
        }
    }

    pub fn read_only() -> Self {
        Self {
            read: Some(true),
            write: Some(false),
            admin: None,
        }
    }

    /// Field-wise union, incoming bias.
    pub fn overlay(&self, incoming: &Self) -> Self {
        Self {
            read: incoming.read.or(self.read),
            write: incoming.write.or(self.write),
            admin: incoming.admin.or(self.admin),
        }
    }
}

/// Reference to another node whose rights additionally apply.
///
/// Non-owning; resolution of the inheritance chain happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InheritedRights {
    pub from: NodeId,
}

/// Rights attached to one node: per-user grants, per-role grants, and an
/// optional inheritance pointer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RightsRecord {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub user: HashMap<Email, RightsBits>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub role: HashMap<Role, RightsBits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherit: Option<InheritedRights>,
}

impl RightsRecord {
    pub fn is_empty(&self) -> bool {
        self.user.is_empty() && self.role.is_empty() && self.inherit.is_none()
    }
}

/// Metadata of a file attached to a node property. The binary payload lives
/// in the per-layer blob table, never in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub filename: String,
    pub content_type: String,
    pub file_size: u64,
}

impl Overlay for FileDescriptor {
    fn overlay(&self, incoming: &Self) -> Self {
        incoming.clone()
    }
}

/// Derived secondary indexes. Maintained by the reducer, never by merge,
/// and excluded from outbound sync payloads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphIndex {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub reverse_edges: ReverseEdgeMap,
}

impl GraphIndex {
    pub fn is_empty(&self) -> bool {
        self.reverse_edges.is_empty()
    }
}

/// One full graph: entity maps plus the derived index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub nodes: HashMap<NodeId, EntityValue<Node>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub edges: EdgeMap,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub rights: HashMap<NodeId, EntityValue<RightsRecord>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub files: FileMap,
    #[serde(default, skip_serializing_if = "GraphIndex::is_empty")]
    pub index: GraphIndex,
}

impl Graph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.edges.is_empty()
            && self.rights.is_empty()
            && self.files.is_empty()
            && self.index.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&EntityValue<Node>> {
        self.nodes.get(id)
    }

    /// The `to_id -> metadata` cell for one `(kind, from_id)` pair.
    pub fn edge_leaves(&self, kind: &EdgeKind, from_id: &str) -> Option<&EdgeLeaves> {
        self.edges
            .get(&kind.from_type)?
            .get(from_id)?
            .get(&kind.to_type)
    }

    pub fn edge(&self, kind: &EdgeKind, from_id: &str, to_id: &str) -> Option<&EntityValue<Metadata>> {
        self.edge_leaves(kind, from_id)?.get(to_id)
    }

    pub fn set_edge(
        &mut self,
        kind: &EdgeKind,
        from_id: &str,
        to_id: &str,
        value: EntityValue<Metadata>,
    ) {
        self.edges
            .entry(kind.from_type.clone())
            .or_default()
            .entry(from_id.to_string())
            .or_default()
            .entry(kind.to_type.clone())
            .or_default()
            .insert(to_id.to_string(), value);
    }

    /// The `from_id -> presence` cell for one `(kind, to_id)` pair of the
    /// reverse index.
    pub fn reverse_leaves(&self, kind: &EdgeKind, to_id: &str) -> Option<&PresenceLeaves> {
        self.index
            .reverse_edges
            .get(&kind.to_type)?
            .get(to_id)?
            .get(&kind.from_type)
    }

    pub fn reverse_edge(&self, kind: &EdgeKind, to_id: &str, from_id: &str) -> Option<&EntityValue<()>> {
        self.reverse_leaves(kind, to_id)?.get(from_id)
    }

    pub fn set_reverse_edge(
        &mut self,
        kind: &EdgeKind,
        to_id: &str,
        from_id: &str,
        value: EntityValue<()>,
    ) {
        self.index
            .reverse_edges
            .entry(kind.to_type.clone())
            .or_default()
            .entry(to_id.to_string())
            .or_default()
            .entry(kind.from_type.clone())
            .or_default()
            .insert(from_id.to_string(), value);
    }

    pub fn file(&self, node_id: &str, prop: &str) -> Option<&EntityValue<FileDescriptor>> {
        self.files.get(node_id)?.get(prop)
    }

    pub fn set_file(&mut self, node_id: &str, prop: &str, value: EntityValue<FileDescriptor>) {
        self.files
            .entry(node_id.to_string())
            .or_default()
            .insert(prop.to_string(), value);
    }

    /// Copy of this graph with the derived index stripped, for outbound
    /// sync payloads.
    pub fn without_index(&self) -> Graph {
        Graph {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            rights: self.rights.clone(),
            files: self.files.clone(),
            index: GraphIndex::default(),
        }
    }
}

/// A per-item push failure, wrapping the original draft value at the same
/// path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct Rejection<T> {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub element: EntityValue<T>,
}

/// Graph-shaped error channel: one `Rejection` leaf per failed path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorGraph {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub nodes: HashMap<NodeId, Rejection<Node>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub edges: HashMap<TypeName, HashMap<NodeId, HashMap<TypeName, HashMap<NodeId, Rejection<Metadata>>>>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub rights: HashMap<NodeId, Rejection<RightsRecord>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub files: HashMap<NodeId, HashMap<Prop, Rejection<FileDescriptor>>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub reverse_edges: HashMap<TypeName, HashMap<NodeId, HashMap<TypeName, HashMap<NodeId, Rejection<()>>>>>,
}

impl ErrorGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.edges.is_empty()
            && self.rights.is_empty()
            && self.files.is_empty()
            && self.reverse_edges.is_empty()
    }

    pub fn set_edge(
        &mut self,
        kind: &EdgeKind,
        from_id: &str,
        to_id: &str,
        rejection: Rejection<Metadata>,
    ) {
        self.edges
            .entry(kind.from_type.clone())
            .or_default()
            .entry(from_id.to_string())
            .or_default()
            .entry(kind.to_type.clone())
            .or_default()
            .insert(to_id.to_string(), rejection);
    }

    pub fn set_reverse_edge(
        &mut self,
        kind: &EdgeKind,
        to_id: &str,
        from_id: &str,
        rejection: Rejection<()>,
    ) {
        self.reverse_edges
            .entry(kind.to_type.clone())
            .or_default()
            .entry(to_id.to_string())
            .or_default()
            .entry(kind.from_type.clone())
            .or_default()
            .insert(from_id.to_string(), rejection);
    }
}
