//! Shared identifier types used across the store, view, and sync components.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Identifier of a graph node. Equal to the `id` field of the node record.
pub type NodeId = String;

/// Name of a node type on either end of an edge (e.g. `"user"`, `"doc"`).
pub type TypeName = String;

/// Property name under which a file hangs off a node.
pub type Prop = String;

/// Name of a graph layer (e.g. `"main"`, `"edit"`).
pub type LayerName = String;

/// E-mail address keying a per-user rights entry.
pub type Email = String;

/// Role name keying a per-role rights entry.
pub type Role = String;

/// A directed edge kind, written `"FromType/ToType"` on the wire.
///
/// Edges are stored under `edges[from_type][from_id][to_type][to_id]`; the
/// reverse index flips the two type/id pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EdgeKind {
    pub from_type: TypeName,
    pub to_type: TypeName,
}

impl EdgeKind {
    pub fn new(from_type: impl Into<TypeName>, to_type: impl Into<TypeName>) -> Self {
        Self {
            from_type: from_type.into(),
            to_type: to_type.into(),
        }
    }

    /// Parse a `"FromType/ToType"` pair.
    ///
    /// Both sides must be non-empty and the string must contain exactly one
    /// separator, otherwise the argument is rejected before any read or
    /// dispatch happens.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let mut parts = raw.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(from), Some(to), None) if !from.is_empty() && !to.is_empty() => {
                Ok(Self::new(from, to))
            }
            _ => Err(StoreError::InvalidParam {
                param: "edge_types",
                reason: format!("expected \"type/type\", got {raw:?}"),
            }),
        }
    }
}

impl FromStr for EdgeKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EdgeKind {
    type Error = StoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<EdgeKind> for String {
    fn from(kind: EdgeKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from_type, self.to_type)
    }
}
