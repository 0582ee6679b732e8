//! View materialization against a layer stack.

use std::collections::HashMap;

use crate::entity::EntityValue;
use crate::store::stack::{
    select_edge, select_files, select_metadata, select_node, select_reverse_edge, select_rights,
};
use crate::store::LayerMap;
use crate::types::{EdgeKind, NodeId};
use crate::view::{NodeBag, QueryNode, View, ViewResult};

/// Materialize a view against a layer stack.
///
/// Roots that do not resolve are omitted entirely — dead references vanish
/// silently. Recursion terminates at query nodes with no further edges.
pub fn select_view<S: AsRef<str>>(stack: &[S], view: &View, state: &LayerMap) -> ViewResult {
    let mut out = ViewResult::new();
    for (root_id, query) in &view.roots {
        let resolved = select_node(stack, root_id, state);
        if !resolved.is_present() {
            continue;
        }
        let bag = build_bag(stack, root_id, resolved, EntityValue::Absent, query, state);
        let key = query.alias.clone().unwrap_or_else(|| root_id.clone());
        out.insert(key, bag);
    }
    out
}

fn build_bag<S: AsRef<str>>(
    stack: &[S],
    node_id: &str,
    resolved: EntityValue<crate::graph::Node>,
    metadata: EntityValue<crate::graph::Metadata>,
    query: &QueryNode,
    state: &LayerMap,
) -> NodeBag {
    let mut bag = NodeBag::new(node_id);
    if query.include.node {
        bag.node = resolved.into_data();
    }
    if query.include.rights {
        bag.rights = select_rights(stack, node_id, state).into_data();
    }
    if query.include.files {
        bag.files = Some(select_files(stack, node_id, state));
    }
    if query.include.metadata {
        bag.metadata = metadata;
    }

    for (edge_types, edge_query) in &query.edges {
        let kind = match EdgeKind::parse(edge_types) {
            Ok(kind) => kind,
            Err(error) => {
                tracing::warn!(%edge_types, %error, "skipping malformed edge declaration");
                continue;
            }
        };

        let connected: Vec<NodeId> = if edge_query.reverse {
            select_reverse_edge(stack, &kind, node_id, state)
                .into_keys()
                .collect()
        } else {
            select_edge(stack, &kind, node_id, state).into_keys().collect()
        };

        let mut bags = HashMap::new();
        for other_id in connected {
            // Metadata always comes from the forward store; the reverse
            // index carries presence only.
            let (from_id, to_id) = if edge_query.reverse {
                (other_id.as_str(), node_id)
            } else {
                (node_id, other_id.as_str())
            };
            let edge_metadata = select_metadata(stack, &kind, from_id, to_id, state);
            if !edge_metadata.is_present() {
                continue;
            }
            let target = select_node(stack, &other_id, state);
            if !target.is_present() {
                continue;
            }
            let child = build_bag(stack, &other_id, target, edge_metadata, &edge_query.node, state);
            bags.insert(other_id, child);
        }

        let key = edge_query
            .node
            .alias
            .clone()
            .unwrap_or_else(|| edge_types.clone());
        bag.edges.insert(key, bags);
    }

    bag
}
