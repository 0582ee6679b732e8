//! Stack resolution: read-side folding of an ordered list of layer names
//! into one effective value.
//!
//! Stacks run base to most-specific; later layers are folded in as the
//! incoming side of `combine`, so a layer that is absent at a path behaves
//! exactly as if it were omitted from the stack. Resolution is read-only
//! and never persists composite state.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::entity::{combine, EntityValue, Overlay};
use crate::graph::{FileDescriptor, Metadata, Node, PresenceLeaves, RightsRecord};
use crate::merge::combine_rights_value;
use crate::store::{GraphLayer, LayerMap};
use crate::types::{EdgeKind, NodeId, Prop};

/// Resolve one node across the stack.
pub fn select_node<S: AsRef<str>>(stack: &[S], id: &str, state: &LayerMap) -> EntityValue<Node> {
    resolve_leaf(stack, state, |layer| layer.graph.node(id))
}

/// Resolve the connected set of one `(edge kind, from node)` pair.
///
/// Connections whose folded value is a tombstone (or never existed) are
/// omitted from the result.
pub fn select_edge<S: AsRef<str>>(
    stack: &[S],
    kind: &EdgeKind,
    from_id: &str,
    state: &LayerMap,
) -> HashMap<NodeId, EntityValue<Metadata>> {
    let mut to_ids: HashSet<NodeId> = HashSet::new();
    for_each_layer(stack, state, |layer| {
        if let Some(leaves) = layer.graph.edge_leaves(kind, from_id) {
            to_ids.extend(leaves.keys().cloned());
        }
    });

    let mut out = HashMap::new();
    for to_id in to_ids {
        let resolved = select_metadata(stack, kind, from_id, &to_id, state);
        if resolved.is_present() {
            out.insert(to_id, resolved);
        }
    }
    out
}

/// Resolve the reverse-index-derived set of one `(edge kind, to node)`
/// pair. The reverse index carries presence only, never metadata.
pub fn select_reverse_edge<S: AsRef<str>>(
    stack: &[S],
    kind: &EdgeKind,
    to_id: &str,
    state: &LayerMap,
) -> PresenceLeaves {
    let mut from_ids: HashSet<NodeId> = HashSet::new();
    for_each_layer(stack, state, |layer| {
        if let Some(leaves) = layer.graph.reverse_leaves(kind, to_id) {
            from_ids.extend(leaves.keys().cloned());
        }
    });

    let mut out = HashMap::new();
    for from_id in from_ids {
        let resolved = resolve_leaf(stack, state, |layer| {
            layer.graph.reverse_edge(kind, to_id, &from_id)
        });
        if resolved.is_present() {
            out.insert(from_id, resolved);
        }
    }
    out
}

/// Resolve the metadata leaf of one specific connection.
pub fn select_metadata<S: AsRef<str>>(
    stack: &[S],
    kind: &EdgeKind,
    from_id: &str,
    to_id: &str,
    state: &LayerMap,
) -> EntityValue<Metadata> {
    resolve_leaf(stack, state, |layer| layer.graph.edge(kind, from_id, to_id))
}

/// Resolve the rights record of one node using the structural fold.
pub fn select_rights<S: AsRef<str>>(
    stack: &[S],
    node_id: &str,
    state: &LayerMap,
) -> EntityValue<RightsRecord> {
    let mut acc: EntityValue<RightsRecord> = EntityValue::Absent;
    for_each_layer(stack, state, |layer| {
        if let Some(value) = layer.graph.rights.get(node_id) {
            acc = combine_rights_value(value, &acc);
        }
    });
    acc
}

/// Resolve the file descriptors of one node, tombstoned props omitted.
pub fn select_files<S: AsRef<str>>(
    stack: &[S],
    node_id: &str,
    state: &LayerMap,
) -> HashMap<Prop, FileDescriptor> {
    let mut props: HashSet<Prop> = HashSet::new();
    for_each_layer(stack, state, |layer| {
        if let Some(files) = layer.graph.files.get(node_id) {
            props.extend(files.keys().cloned());
        }
    });

    let mut out = HashMap::new();
    for prop in props {
        let resolved = resolve_leaf(stack, state, |layer| layer.graph.file(node_id, &prop));
        if let EntityValue::Data(descriptor) = resolved {
            out.insert(prop, descriptor);
        }
    }
    out
}

/// Resolve one layer variable: plain overwrite, most specific layer wins.
pub fn select_var<S: AsRef<str>>(stack: &[S], name: &str, state: &LayerMap) -> Option<Value> {
    let mut out = None;
    for_each_layer(stack, state, |layer| {
        if let Some(value) = layer.vars.get(name) {
            out = Some(value.clone());
        }
    });
    out
}

fn for_each_layer<'a, S: AsRef<str>>(
    stack: &[S],
    state: &'a LayerMap,
    mut visit: impl FnMut(&'a GraphLayer),
) {
    for name in stack {
        if let Some(layer) = state.get(name.as_ref()) {
            visit(layer);
        }
    }
}

fn resolve_leaf<'a, S, T, F>(stack: &[S], state: &'a LayerMap, get: F) -> EntityValue<T>
where
    S: AsRef<str>,
    T: Overlay + Clone + 'a,
    F: Fn(&'a GraphLayer) -> Option<&'a EntityValue<T>>,
{
    let mut acc = EntityValue::Absent;
    for name in stack {
        if let Some(layer) = state.get(name.as_ref()) {
            if let Some(value) = get(layer) {
                acc = combine(value, &acc);
            }
        }
    }
    acc
}
