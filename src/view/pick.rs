//! Graph picking: walk a view against a single graph and copy (or clear)
//! every path the view addresses into a fresh sub-graph keyed identically.
//!
//! Used to build synchronization payloads and, in clearing mode, to mark
//! every currently-resolvable path as a pull clearing candidate.

use crate::entity::EntityValue;
use crate::graph::Graph;
use crate::types::EdgeKind;
use crate::view::{QueryNode, View};

/// What to write at each addressed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickMode {
    /// Copy the value found in the source graph.
    Copy,
    /// Write an explicit `Absent` clearing marker.
    Clear,
}

/// Extract the sub-graph a view addresses, verbatim.
pub fn filter_graph(view: &View, graph: &Graph) -> Graph {
    pick_graph(view, graph, PickMode::Copy)
}

/// Walk `view` against `graph` and produce a fresh sub-graph containing one
/// entry per addressed, present path: the original value in
/// [`PickMode::Copy`], an `Absent` marker in [`PickMode::Clear`].
///
/// Unlike materialization this walks a single graph, not a stack, and the
/// result is graph-shaped rather than a result tree.
pub fn pick_graph(view: &View, graph: &Graph, mode: PickMode) -> Graph {
    let mut out = Graph::default();
    for (root_id, query) in &view.roots {
        visit(graph, root_id, query, mode, &mut out);
    }
    out
}

fn pick<T: Clone>(value: &EntityValue<T>, mode: PickMode) -> EntityValue<T> {
    match mode {
        PickMode::Copy => value.clone(),
        PickMode::Clear => EntityValue::Absent,
    }
}

fn visit(graph: &Graph, node_id: &str, query: &QueryNode, mode: PickMode, out: &mut Graph) {
    if query.include.node {
        if let Some(value) = graph.node(node_id) {
            out.nodes.insert(node_id.to_string(), pick(value, mode));
        }
    }
    if query.include.rights {
        if let Some(value) = graph.rights.get(node_id) {
            out.rights.insert(node_id.to_string(), pick(value, mode));
        }
    }
    if query.include.files {
        if let Some(props) = graph.files.get(node_id) {
            for (prop, value) in props {
                out.set_file(node_id, prop, pick(value, mode));
            }
        }
    }

    for (edge_types, edge_query) in &query.edges {
        let kind = match EdgeKind::parse(edge_types) {
            Ok(kind) => kind,
            Err(error) => {
                tracing::warn!(%edge_types, %error, "skipping malformed edge declaration");
                continue;
            }
        };

        if edge_query.reverse {
            let Some(leaves) = graph.reverse_leaves(&kind, node_id) else {
                continue;
            };
            for (from_id, presence) in leaves {
                out.set_reverse_edge(&kind, node_id, from_id, pick(presence, mode));
                if let Some(forward) = graph.edge(&kind, from_id, node_id) {
                    out.set_edge(&kind, from_id, node_id, pick(forward, mode));
                }
                visit(graph, from_id, &edge_query.node, mode, out);
            }
        } else {
            let Some(leaves) = graph.edge_leaves(&kind, node_id) else {
                continue;
            };
            for (to_id, value) in leaves {
                out.set_edge(&kind, node_id, to_id, pick(value, mode));
                if let Some(presence) = graph.reverse_edge(&kind, to_id, node_id) {
                    out.set_reverse_edge(&kind, to_id, node_id, pick(presence, mode));
                }
                visit(graph, to_id, &edge_query.node, mode, out);
            }
        }
    }
}
