//! The pure state-transition function.
//!
//! Invariant enforced by construction: every forward edge write is paired
//! with the matching reverse-index write in the same match arm, so the two
//! sides can never drift apart through the reducer.

use crate::entity::{combine, EntityValue};
use crate::graph::{FileDescriptor, Graph, InheritedRights, RightsRecord};
use crate::merge::{merge_error_graphs, merge_graphs_right, merge_overwrite_graphs_right};
use crate::store::action::{Action, MergeSource};
use crate::store::{BlobEntry, LayerMap, UploadStatus};

/// Apply one action to the layer map.
pub fn reduce(state: &mut LayerMap, action: Action) {
    match action {
        Action::SetNode { layer, node } => {
            let graph = &mut state.entry(layer).or_default().graph;
            set_node_combined(graph, node);
        }

        Action::Add {
            layer,
            kind,
            from_id,
            to_node,
            metadata,
        } => {
            let graph = &mut state.entry(layer).or_default().graph;
            let to_id = to_node.id.clone();
            set_node_combined(graph, to_node);
            let existing = graph
                .edge(&kind, &from_id, &to_id)
                .cloned()
                .unwrap_or_default();
            graph.set_edge(&kind, &from_id, &to_id, combine(&metadata, &existing));
            graph.set_reverse_edge(&kind, &to_id, &from_id, EntityValue::Marker);
        }

        Action::Assoc {
            layer,
            kind,
            from_id,
            to_id,
            metadata,
        } => {
            let graph = &mut state.entry(layer).or_default().graph;
            let existing = graph
                .edge(&kind, &from_id, &to_id)
                .cloned()
                .unwrap_or_default();
            graph.set_edge(&kind, &from_id, &to_id, combine(&metadata, &existing));
            graph.set_reverse_edge(&kind, &to_id, &from_id, EntityValue::Marker);
        }

        Action::Remove {
            layer,
            kind,
            from_id,
            to_id,
        } => {
            let graph = &mut state.entry(layer).or_default().graph;
            graph.nodes.insert(to_id.clone(), EntityValue::Tombstone);
            graph.set_edge(&kind, &from_id, &to_id, EntityValue::Tombstone);
            graph.set_reverse_edge(&kind, &to_id, &from_id, EntityValue::Tombstone);
        }

        Action::Dissoc {
            layer,
            kind,
            from_id,
            to_id,
        } => {
            let graph = &mut state.entry(layer).or_default().graph;
            graph.set_edge(&kind, &from_id, &to_id, EntityValue::Tombstone);
            graph.set_reverse_edge(&kind, &to_id, &from_id, EntityValue::Tombstone);
        }

        Action::SetRights {
            layer,
            node_id,
            email,
            rights,
        } => {
            let graph = &mut state.entry(layer).or_default().graph;
            let record = ensure_rights(graph, &node_id);
            let merged = record
                .user
                .get(&email)
                .map_or(rights, |existing| existing.overlay(&rights));
            record.user.insert(email, merged);
        }

        Action::SetRoleRights {
            layer,
            node_id,
            role,
            rights,
        } => {
            let graph = &mut state.entry(layer).or_default().graph;
            let record = ensure_rights(graph, &node_id);
            let merged = record
                .role
                .get(&role)
                .map_or(rights, |existing| existing.overlay(&rights));
            record.role.insert(role, merged);
        }

        Action::InheritRights {
            layer,
            node_id,
            from,
        } => {
            let graph = &mut state.entry(layer).or_default().graph;
            ensure_rights(graph, &node_id).inherit = Some(InheritedRights { from });
        }

        Action::SetFile {
            layer,
            node_id,
            prop,
            filename,
            blob,
        } => {
            let layer = state.entry(layer).or_default();
            let descriptor = FileDescriptor {
                filename,
                content_type: blob.content_type().to_string(),
                file_size: blob.size(),
            };
            layer
                .graph
                .set_file(&node_id, &prop, EntityValue::Data(descriptor));
            layer.files.entry(node_id).or_default().insert(
                prop,
                BlobEntry {
                    blob: Some(blob),
                    status: UploadStatus::Pending,
                },
            );
        }

        Action::RemoveFile {
            layer,
            node_id,
            prop,
        } => {
            let layer = state.entry(layer).or_default();
            layer
                .graph
                .set_file(&node_id, &prop, EntityValue::Tombstone);
            if let Some(props) = layer.files.get_mut(&node_id) {
                props.remove(&prop);
                if props.is_empty() {
                    layer.files.remove(&node_id);
                }
            }
        }

        Action::SetVar { layer, name, value } => {
            state.entry(layer).or_default().vars.insert(name, value);
        }

        Action::Merge { source, target } => {
            let incoming = match source {
                MergeSource::Graph(graph) => graph,
                MergeSource::Layer(name) => match state.get(&name) {
                    Some(layer) => layer.graph.clone(),
                    None => return,
                },
            };
            let layer = state.entry(target).or_default();
            layer.graph = merge_graphs_right(&layer.graph, &incoming);
        }

        Action::MergeError { errors, target } => {
            let layer = state.entry(target).or_default();
            layer.errors = merge_error_graphs(&layer.errors, &errors);
        }

        Action::MergeOverwrite { graph, target } => {
            let layer = state.entry(target).or_default();
            layer.graph = merge_overwrite_graphs_right(&layer.graph, &graph);
        }

        Action::Clear { layer } => {
            state.remove(&layer);
        }

        Action::ClearAll => {
            state.clear();
        }

        Action::UploadProgress {
            layer,
            node_id,
            prop,
            progress,
        } => {
            set_upload_status(state, &layer, &node_id, &prop, UploadStatus::InFlight(progress));
        }

        Action::UploadComplete {
            layer,
            node_id,
            prop,
        } => {
            set_upload_status(state, &layer, &node_id, &prop, UploadStatus::Complete);
        }

        Action::UploadError {
            layer,
            node_id,
            prop,
            message,
        } => {
            set_upload_status(state, &layer, &node_id, &prop, UploadStatus::Failed(message));
        }
    }
}

/// Combine-merge a node body into `nodes[id]`.
fn set_node_combined(graph: &mut Graph, node: crate::graph::Node) {
    let id = node.id.clone();
    let existing = graph.nodes.get(&id).cloned().unwrap_or_default();
    graph
        .nodes
        .insert(id, combine(&EntityValue::Data(node), &existing));
}

/// Rights writes always land in a `Data` record; any other stored state is
/// replaced by a fresh record first.
fn ensure_rights<'a>(graph: &'a mut Graph, node_id: &str) -> &'a mut RightsRecord {
    let entry = graph
        .rights
        .entry(node_id.to_string())
        .or_insert_with(|| EntityValue::Data(RightsRecord::default()));
    if !matches!(entry, EntityValue::Data(_)) {
        *entry = EntityValue::Data(RightsRecord::default());
    }
    match entry {
        EntityValue::Data(record) => record,
        _ => unreachable!(),
    }
}

/// Status lands under `layer.files[node_id][prop]` even when the staging
/// layer was cleared in the meantime; a status-only entry is created so the
/// upload outcome stays observable.
fn set_upload_status(
    state: &mut LayerMap,
    layer: &str,
    node_id: &str,
    prop: &str,
    status: UploadStatus,
) {
    state
        .entry(layer.to_string())
        .or_default()
        .files
        .entry(node_id.to_string())
        .or_default()
        .entry(prop.to_string())
        .or_insert_with(|| BlobEntry {
            blob: None,
            status: UploadStatus::Pending,
        })
        .status = status;
}
