//! Stack resolution through the store's bound reads.

use strata::entity::EntityValue;
use strata::graph::RightsBits;
use strata::store::{Action, FileBlob, Store};
use strata::types::EdgeKind;
use strata::Node;

use super::test_utils::meta;
use serde_json::json;

#[test]
fn tombstoned_edge_in_a_later_layer_empties_the_read() {
    let store = Store::new();
    store.dispatch(Action::Assoc {
        layer: "A".into(),
        kind: EdgeKind::new("T1", "T2"),
        from_id: "f1".into(),
        to_id: "n1".into(),
        metadata: EntityValue::Data(meta(&[("order", json!(0))])),
    });
    store.dispatch(Action::Dissoc {
        layer: "B".into(),
        kind: EdgeKind::new("T1", "T2"),
        from_id: "f1".into(),
        to_id: "n1".into(),
    });

    let connected = store.edge(&["A", "B"], "T1/T2", "f1").unwrap();
    assert!(connected.is_empty());
}

#[test]
fn stack_skip_law_holds_for_bound_reads() {
    let store = Store::new();
    store.dispatch(Action::SetNode {
        layer: "base".into(),
        node: Node::new("n1").with("v", json!(1)),
    });

    let with_ghost = store.node(&["base", "ghost"], "n1");
    let without = store.node(&["base"], "n1");
    assert_eq!(with_ghost, without);
}

#[test]
fn files_resolve_across_layers_with_tombstones_omitted() {
    let store = Store::new();
    store.dispatch(Action::SetFile {
        layer: "base".into(),
        node_id: "n1".into(),
        prop: "photo".into(),
        filename: "a.png".into(),
        blob: FileBlob::new("image/png", vec![0; 4]),
    });
    store.dispatch(Action::SetFile {
        layer: "base".into(),
        node_id: "n1".into(),
        prop: "attachment".into(),
        filename: "a.pdf".into(),
        blob: FileBlob::new("application/pdf", vec![0; 9]),
    });
    store.dispatch(Action::RemoveFile {
        layer: "edit".into(),
        node_id: "n1".into(),
        prop: "photo".into(),
    });

    let files = store.files(&["base", "edit"], "n1");
    assert_eq!(files.len(), 1);
    assert_eq!(files["attachment"].filename, "a.pdf");
    assert_eq!(files["attachment"].file_size, 9);
}

#[test]
fn rights_union_across_layers() {
    let store = Store::new();
    store.dispatch(Action::SetRights {
        layer: "base".into(),
        node_id: "n1".into(),
        email: "a@x".into(),
        rights: RightsBits::read_only(),
    });
    store.dispatch(Action::SetRoleRights {
        layer: "edit".into(),
        node_id: "n1".into(),
        role: "editor".into(),
        rights: RightsBits::read_write(),
    });
    store.dispatch(Action::InheritRights {
        layer: "edit".into(),
        node_id: "n1".into(),
        from: "parent".into(),
    });

    let resolved = store.rights(&["base", "edit"], "n1");
    let record = resolved.as_data().unwrap();
    assert!(record.user.contains_key("a@x"));
    assert!(record.role.contains_key("editor"));
    assert_eq!(record.inherit.as_ref().unwrap().from, "parent");
}

#[test]
fn metadata_resolves_fields_from_both_layers() {
    let store = Store::new();
    let kind = EdgeKind::new("user", "doc");
    store.dispatch(Action::Assoc {
        layer: "base".into(),
        kind: kind.clone(),
        from_id: "u1".into(),
        to_id: "d1".into(),
        metadata: EntityValue::Data(meta(&[("order", json!(0)), ("pin", json!(false))])),
    });
    store.dispatch(Action::Assoc {
        layer: "edit".into(),
        kind,
        from_id: "u1".into(),
        to_id: "d1".into(),
        metadata: EntityValue::Data(meta(&[("pin", json!(true))])),
    });

    let resolved = store
        .metadata(&["base", "edit"], "user/doc", "u1", "d1")
        .unwrap();
    let fields = resolved.as_data().unwrap();
    assert_eq!(fields.get("order"), Some(&json!(0)));
    assert_eq!(fields.get("pin"), Some(&json!(true)));
}

#[test]
fn reverse_reads_see_edges_from_every_layer() {
    let store = Store::new();
    store.dispatch(Action::Assoc {
        layer: "A".into(),
        kind: EdgeKind::new("user", "doc"),
        from_id: "u1".into(),
        to_id: "d1".into(),
        metadata: EntityValue::Marker,
    });
    store.dispatch(Action::Assoc {
        layer: "B".into(),
        kind: EdgeKind::new("user", "doc"),
        from_id: "u2".into(),
        to_id: "d1".into(),
        metadata: EntityValue::Marker,
    });

    let incoming = store.reverse_edge(&["A", "B"], "user/doc", "d1").unwrap();
    assert_eq!(incoming.len(), 2);
    assert!(incoming.contains_key("u1"));
    assert!(incoming.contains_key("u2"));
}

#[test]
fn vars_overwrite_per_layer_order() {
    let store = Store::new();
    store.dispatch(Action::SetVar {
        layer: "base".into(),
        name: "selection".into(),
        value: json!(["n1"]),
    });
    store.dispatch(Action::SetVar {
        layer: "edit".into(),
        name: "selection".into(),
        value: json!(["n2"]),
    });

    assert_eq!(
        store.var(&["base", "edit"], "selection"),
        Some(json!(["n2"]))
    );
}
