//! Overlay and Replace merge policies over whole graphs.
//!
//! Both policies walk the same fixed shapes: `nodes`/`files` at depth 1–2,
//! `edges` at depth 4 with a metadata leaf, and the structural `rights` and
//! `index` sections. Overlay Merge folds leaves through [`combine`]; Replace
//! Merge substitutes leaves outright and treats an explicit `Absent` as a
//! hard delete. Neither policy maintains the reverse index — that is the
//! reducer's job.

use std::collections::HashMap;

use crate::entity::{combine, EntityValue, Overlay};
use crate::graph::{ErrorGraph, Graph, GraphIndex, RightsRecord};

type Nested4<V> = HashMap<String, HashMap<String, HashMap<String, HashMap<String, V>>>>;

/// Overlay Merge, right-biased: the right graph is the newer layer.
pub fn merge_graphs_right(left: &Graph, right: &Graph) -> Graph {
    Graph {
        nodes: overlay_leaves(&left.nodes, &right.nodes),
        edges: merge_nested4(&left.edges, &right.edges, overlay_leaves),
        rights: overlay_rights(&left.rights, &right.rights),
        files: merge_nested2(&left.files, &right.files, overlay_leaves),
        index: GraphIndex {
            reverse_edges: merge_nested4(
                &left.index.reverse_edges,
                &right.index.reverse_edges,
                union_leaves,
            ),
        },
    }
}

/// Overlay Merge, left-biased.
pub fn merge_graphs_left(left: &Graph, right: &Graph) -> Graph {
    merge_graphs_right(right, left)
}

/// Replace Merge, right-biased: the right graph is remote truth.
pub fn merge_overwrite_graphs_right(left: &Graph, right: &Graph) -> Graph {
    Graph {
        nodes: replace_leaves(&left.nodes, &right.nodes),
        edges: merge_nested4(&left.edges, &right.edges, replace_leaves),
        rights: replace_rights(&left.rights, &right.rights),
        files: merge_nested2(&left.files, &right.files, replace_leaves),
        index: GraphIndex {
            reverse_edges: merge_nested4(
                &left.index.reverse_edges,
                &right.index.reverse_edges,
                replace_union_leaves,
            ),
        },
    }
}

/// Replace Merge, left-biased.
pub fn merge_overwrite_graphs_left(left: &Graph, right: &Graph) -> Graph {
    merge_overwrite_graphs_right(right, left)
}

/// Right-biased key union of two error channels. Leaves are whole
/// rejections; the newer report for a path wins.
pub fn merge_error_graphs(left: &ErrorGraph, right: &ErrorGraph) -> ErrorGraph {
    ErrorGraph {
        nodes: union_map(&left.nodes, &right.nodes),
        edges: merge_nested4(&left.edges, &right.edges, union_map),
        rights: union_map(&left.rights, &right.rights),
        files: merge_nested2(&left.files, &right.files, union_map),
        reverse_edges: merge_nested4(&left.reverse_edges, &right.reverse_edges, union_map),
    }
}

/// Key union folding overlapping tri-state leaves through `combine`. An
/// explicit incoming `Absent` never overrides, but the key survives as a
/// stored clearing marker when the left side had no value.
fn overlay_leaves<T: Overlay + Clone>(
    left: &HashMap<String, EntityValue<T>>,
    right: &HashMap<String, EntityValue<T>>,
) -> HashMap<String, EntityValue<T>> {
    let mut out = left.clone();
    for (key, incoming) in right {
        let merged = match out.get(key) {
            Some(existing) => combine(incoming, existing),
            None => combine(incoming, &EntityValue::Absent),
        };
        out.insert(key.clone(), merged);
    }
    out
}

/// Key union replacing overlapping leaves outright. An incoming `Marker` is
/// still suppressed when the existing value is `Data`; an explicit incoming
/// `Absent` deletes the key.
fn replace_leaves<T: Clone>(
    left: &HashMap<String, EntityValue<T>>,
    right: &HashMap<String, EntityValue<T>>,
) -> HashMap<String, EntityValue<T>> {
    let mut out = left.clone();
    for (key, incoming) in right {
        match incoming {
            EntityValue::Absent => {
                out.remove(key);
            }
            EntityValue::Marker => {
                if !matches!(out.get(key), Some(EntityValue::Data(_))) {
                    out.insert(key.clone(), EntityValue::Marker);
                }
            }
            other => {
                out.insert(key.clone(), other.clone());
            }
        }
    }
    out
}

/// Structural key union: the right leaf always wins, and an explicit
/// `Absent` is preserved as a stored soft-delete marker.
fn union_leaves<T: Clone>(
    left: &HashMap<String, EntityValue<T>>,
    right: &HashMap<String, EntityValue<T>>,
) -> HashMap<String, EntityValue<T>> {
    let mut out = left.clone();
    for (key, incoming) in right {
        out.insert(key.clone(), incoming.clone());
    }
    out
}

/// Structural key union under Replace Merge: right wins, `Absent` deletes.
fn replace_union_leaves<T: Clone>(
    left: &HashMap<String, EntityValue<T>>,
    right: &HashMap<String, EntityValue<T>>,
) -> HashMap<String, EntityValue<T>> {
    let mut out = left.clone();
    for (key, incoming) in right {
        match incoming {
            EntityValue::Absent => {
                out.remove(key);
            }
            other => {
                out.insert(key.clone(), other.clone());
            }
        }
    }
    out
}

/// Plain right-biased key union for non-tri-state leaves.
fn union_map<V: Clone>(left: &HashMap<String, V>, right: &HashMap<String, V>) -> HashMap<String, V> {
    let mut out = left.clone();
    for (key, value) in right {
        out.insert(key.clone(), value.clone());
    }
    out
}

/// Recursive key union of two rights sections: grants from both sides
/// survive, overlapping grants take the right value, an explicit `Absent`
/// record is preserved as stored.
fn overlay_rights(
    left: &HashMap<String, EntityValue<RightsRecord>>,
    right: &HashMap<String, EntityValue<RightsRecord>>,
) -> HashMap<String, EntityValue<RightsRecord>> {
    let mut out = left.clone();
    for (key, incoming) in right {
        let merged = match out.get(key) {
            Some(existing) => combine_rights_value(incoming, existing),
            None => incoming.clone(),
        };
        out.insert(key.clone(), merged);
    }
    out
}

/// The structural combination rule for one rights leaf: the incoming value
/// wins outright unless both sides are records, which union recursively.
/// Shared by the merge policies and stack resolution.
pub(crate) fn combine_rights_value(
    incoming: &EntityValue<RightsRecord>,
    existing: &EntityValue<RightsRecord>,
) -> EntityValue<RightsRecord> {
    match (existing, incoming) {
        (EntityValue::Data(left), EntityValue::Data(right)) => {
            EntityValue::Data(union_rights_record(left, right))
        }
        _ => incoming.clone(),
    }
}

/// Rights under Replace Merge: the incoming record substitutes the local
/// one, `Absent` hard-deletes the entry.
fn replace_rights(
    left: &HashMap<String, EntityValue<RightsRecord>>,
    right: &HashMap<String, EntityValue<RightsRecord>>,
) -> HashMap<String, EntityValue<RightsRecord>> {
    let mut out = left.clone();
    for (key, incoming) in right {
        match incoming {
            EntityValue::Absent => {
                out.remove(key);
            }
            other => {
                out.insert(key.clone(), other.clone());
            }
        }
    }
    out
}

fn union_rights_record(left: &RightsRecord, right: &RightsRecord) -> RightsRecord {
    let mut user = left.user.clone();
    for (email, bits) in &right.user {
        let merged = user.get(email).map_or(*bits, |existing| existing.overlay(bits));
        user.insert(email.clone(), merged);
    }
    let mut role = left.role.clone();
    for (name, bits) in &right.role {
        let merged = role.get(name).map_or(*bits, |existing| existing.overlay(bits));
        role.insert(name.clone(), merged);
    }
    RightsRecord {
        user,
        role,
        inherit: right.inherit.clone().or_else(|| left.inherit.clone()),
    }
}

fn merge_nested2<V, C>(
    left: &HashMap<String, HashMap<String, V>>,
    right: &HashMap<String, HashMap<String, V>>,
    cell_merge: C,
) -> HashMap<String, HashMap<String, V>>
where
    V: Clone,
    C: Fn(&HashMap<String, V>, &HashMap<String, V>) -> HashMap<String, V>,
{
    let mut out = left.clone();
    for (key, incoming) in right {
        let merged = match out.get(key) {
            Some(existing) => cell_merge(existing, incoming),
            None => cell_merge(&HashMap::new(), incoming),
        };
        out.insert(key.clone(), merged);
    }
    out
}

fn merge_nested4<V, C>(left: &Nested4<V>, right: &Nested4<V>, cell_merge: C) -> Nested4<V>
where
    V: Clone,
    C: Fn(&HashMap<String, V>, &HashMap<String, V>) -> HashMap<String, V>,
{
    let mut out = left.clone();
    for (k1, r1) in right {
        let o1 = out.entry(k1.clone()).or_default();
        for (k2, r2) in r1 {
            let o2 = o1.entry(k2.clone()).or_default();
            for (k3, cell) in r2 {
                let merged = match o2.get(k3) {
                    Some(existing) => cell_merge(existing, cell),
                    None => cell_merge(&HashMap::new(), cell),
                };
                o2.insert(k3.clone(), merged);
            }
        }
    }
    out
}
