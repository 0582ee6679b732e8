//! Declarative view queries: recursive traversal specs, their materialized
//! result trees, and graph picking.
//!
//! A [`View`] is a plain data literal (serde round-trippable) mapping root
//! node ids to [`QueryNode`]s. Materialization against a layer stack lives
//! in [`select_view`]; path-addressed sub-graph extraction against a single
//! graph lives in [`pick_graph`]/[`filter_graph`].

mod pick;
mod select;

pub use pick::{filter_graph, pick_graph, PickMode};
pub use select::select_view;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityValue;
use crate::graph::{FileDescriptor, Metadata, Node, RightsRecord};
use crate::types::{NodeId, Prop};

/// Which sections of a node to populate in the result bag.
///
/// The `edges` flag is accepted in query literals for wire compatibility;
/// traversal itself is driven by the declared edge map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Include {
    pub node: bool,
    pub rights: bool,
    pub edges: bool,
    pub metadata: bool,
    pub files: bool,
}

impl Include {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One level of a view: output alias, include flags, and the edges to
/// traverse from here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryNode {
    #[serde(rename = "as", default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Include::is_empty")]
    pub include: Include,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub edges: HashMap<String, EdgeQuery>,
}

impl QueryNode {
    pub fn builder() -> QueryNodeBuilder {
        QueryNodeBuilder::default()
    }
}

/// An edge declaration: traversal direction plus the query applied to every
/// connected node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeQuery {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reverse: bool,
    #[serde(flatten)]
    pub node: QueryNode,
}

/// Fluent builder for [`QueryNode`].
#[derive(Debug, Default)]
pub struct QueryNodeBuilder {
    alias: Option<String>,
    include: Include,
    edges: HashMap<String, EdgeQuery>,
}

impl QueryNodeBuilder {
    /// Rename the output key (never the underlying id).
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Include the resolved node record.
    pub fn node(mut self) -> Self {
        self.include.node = true;
        self
    }

    /// Include the resolved rights record.
    pub fn rights(mut self) -> Self {
        self.include.rights = true;
        self
    }

    /// Include connection metadata on traversed nodes.
    pub fn metadata(mut self) -> Self {
        self.include.metadata = true;
        self
    }

    /// Include the resolved file descriptors.
    pub fn files(mut self) -> Self {
        self.include.files = true;
        self
    }

    /// Traverse a forward edge kind (`"FromType/ToType"`).
    pub fn edge(mut self, edge_types: impl Into<String>, query: QueryNode) -> Self {
        self.edges.insert(
            edge_types.into(),
            EdgeQuery {
                reverse: false,
                node: query,
            },
        );
        self
    }

    /// Traverse an edge kind against its direction, via the reverse index.
    pub fn reverse_edge(mut self, edge_types: impl Into<String>, query: QueryNode) -> Self {
        self.edges.insert(
            edge_types.into(),
            EdgeQuery {
                reverse: true,
                node: query,
            },
        );
        self
    }

    pub fn build(self) -> QueryNode {
        QueryNode {
            alias: self.alias,
            include: self.include,
            edges: self.edges,
        }
    }
}

/// A view: root node ids with their queries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct View {
    pub roots: HashMap<NodeId, QueryNode>,
}

impl View {
    pub fn builder() -> ViewBuilder {
        ViewBuilder::default()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Fluent builder for [`View`].
#[derive(Debug, Default)]
pub struct ViewBuilder {
    roots: HashMap<NodeId, QueryNode>,
}

impl ViewBuilder {
    pub fn root(mut self, id: impl Into<NodeId>, query: QueryNode) -> Self {
        self.roots.insert(id.into(), query);
        self
    }

    pub fn build(self) -> View {
        View { roots: self.roots }
    }
}

/// Materialized result: output key (alias or id) to node bag.
pub type ViewResult = HashMap<String, NodeBag>;

/// One materialized node. `node_id` is always present; the other sections
/// follow the include flags of the query that produced the bag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeBag {
    pub node_id: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rights: Option<RightsRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<HashMap<Prop, FileDescriptor>>,
    /// Connection metadata, populated on traversed nodes only. `Marker`
    /// renders a bare `true` connection.
    #[serde(skip_serializing_if = "EntityValue::is_absent")]
    pub metadata: EntityValue<Metadata>,
    #[serde(flatten)]
    pub edges: HashMap<String, HashMap<NodeId, NodeBag>>,
}

impl NodeBag {
    pub(crate) fn new(node_id: impl Into<NodeId>) -> Self {
        Self {
            node_id: node_id.into(),
            node: None,
            rights: None,
            files: None,
            metadata: EntityValue::Absent,
            edges: HashMap::new(),
        }
    }
}
