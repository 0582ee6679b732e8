//! View materialization across layers.

use strata::entity::EntityValue;
use strata::store::{Action, FileBlob, Store};
use strata::types::EdgeKind;
use strata::view::{QueryNode, View};
use strata::Node;

use super::test_utils::meta;
use serde_json::json;

fn seeded_store() -> Store {
    let store = Store::new();
    store.dispatch(Action::SetNode {
        layer: "main".into(),
        node: Node::new("u1").with("name", json!("ada")),
    });
    store.dispatch(Action::Add {
        layer: "main".into(),
        kind: EdgeKind::new("user", "doc"),
        from_id: "u1".into(),
        to_node: Node::new("d1").with("title", json!("notes")),
        metadata: EntityValue::Data(meta(&[("order", json!(0))])),
    });
    store.dispatch(Action::SetFile {
        layer: "main".into(),
        node_id: "d1".into(),
        prop: "attachment".into(),
        filename: "notes.pdf".into(),
        blob: FileBlob::new("application/pdf", vec![0; 16]),
    });
    store
}

#[test]
fn view_over_edits_sees_the_overlaid_world() {
    let store = seeded_store();
    store.dispatch(Action::SetNode {
        layer: "edit".into(),
        node: Node::new("d1").with("title", json!("draft title")),
    });

    let view = View::builder()
        .root(
            "u1",
            QueryNode::builder()
                .node()
                .edge("user/doc", QueryNode::builder().node().build())
                .build(),
        )
        .build();

    let result = store.view(&["main", "edit"], &view);
    let doc = &result["u1"].edges["user/doc"]["d1"];
    assert_eq!(
        doc.node.as_ref().unwrap().field("title"),
        Some(&json!("draft title"))
    );
}

#[test]
fn files_and_metadata_follow_include_flags() {
    let store = seeded_store();
    let view = View::builder()
        .root(
            "u1",
            QueryNode::builder()
                .edge(
                    "user/doc",
                    QueryNode::builder().node().metadata().files().build(),
                )
                .build(),
        )
        .build();

    let result = store.view(&["main"], &view);
    let root = &result["u1"];
    // Root did not ask for its node record.
    assert!(root.node.is_none());

    let doc = &root.edges["user/doc"]["d1"];
    assert_eq!(doc.metadata.as_data().unwrap().get("order"), Some(&json!(0)));
    let files = doc.files.as_ref().unwrap();
    assert_eq!(files["attachment"].filename, "notes.pdf");
}

#[test]
fn removed_target_node_drops_the_connection() {
    let store = seeded_store();
    store.dispatch(Action::Remove {
        layer: "edit".into(),
        kind: EdgeKind::new("user", "doc"),
        from_id: "u1".into(),
        to_id: "d1".into(),
    });

    let view = View::builder()
        .root(
            "u1",
            QueryNode::builder()
                .node()
                .edge("user/doc", QueryNode::builder().node().build())
                .build(),
        )
        .build();

    let result = store.view(&["main", "edit"], &view);
    assert!(result["u1"].edges["user/doc"].is_empty());
}

#[test]
fn result_tree_serializes_with_wire_field_names() {
    let store = seeded_store();
    let view = View::builder()
        .root("u1", QueryNode::builder().node().build())
        .build();

    let result = store.view(&["main"], &view);
    let raw = serde_json::to_value(&result).unwrap();
    assert_eq!(raw["u1"]["nodeId"], json!("u1"));
    assert_eq!(raw["u1"]["node"]["name"], json!("ada"));
}

#[test]
fn reverse_views_work_through_the_store_handle() {
    let store = seeded_store();
    let view = View::builder()
        .root(
            "d1",
            QueryNode::builder()
                .node()
                .reverse_edge("user/doc", QueryNode::builder().node().metadata().build())
                .build(),
        )
        .build();

    let result = store.view(&["main"], &view);
    let author = &result["d1"].edges["user/doc"]["u1"];
    assert_eq!(author.node.as_ref().unwrap().field("name"), Some(&json!("ada")));
    assert_eq!(
        author.metadata.as_data().unwrap().get("order"),
        Some(&json!(0))
    );
}
