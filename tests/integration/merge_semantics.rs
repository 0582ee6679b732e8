//! Overlay vs Replace merge behavior observed through the store.

use strata::entity::EntityValue;
use strata::store::{Action, MergeSource, Store};
use strata::{Graph, Node};

use serde_json::json;

fn graph_with(id: &str, value: EntityValue<Node>) -> Graph {
    let mut graph = Graph::default();
    graph.nodes.insert(id.to_string(), value);
    graph
}

#[test]
fn overlay_merge_soft_deletes_on_explicit_absent() {
    let store = Store::new();
    store.dispatch(Action::Merge {
        source: MergeSource::Graph(graph_with("n1", EntityValue::Absent)),
        target: "main".into(),
    });

    store.select(|state| {
        // The key survives as a stored clearing marker.
        assert_eq!(
            state["main"].graph.nodes.get("n1"),
            Some(&EntityValue::Absent)
        );
    });
}

#[test]
fn replace_merge_hard_deletes_on_explicit_absent() {
    let store = Store::new();
    store.dispatch(Action::SetNode {
        layer: "main".into(),
        node: Node::new("n1"),
    });
    store.dispatch(Action::MergeOverwrite {
        graph: graph_with("n1", EntityValue::Absent),
        target: "main".into(),
    });

    store.select(|state| {
        assert!(!state["main"].graph.nodes.contains_key("n1"));
    });
}

#[test]
fn overlay_merge_combines_node_fields() {
    let store = Store::new();
    store.dispatch(Action::SetNode {
        layer: "main".into(),
        node: Node::new("n1").with("a", json!(1)),
    });
    store.dispatch(Action::Merge {
        source: MergeSource::Graph(graph_with(
            "n1",
            EntityValue::Data(Node::new("n1").with("b", json!(2))),
        )),
        target: "main".into(),
    });

    store.select(|state| {
        let node = state["main"].graph.nodes["n1"].as_data().unwrap().clone();
        assert_eq!(node.field("a"), Some(&json!(1)));
        assert_eq!(node.field("b"), Some(&json!(2)));
    });
}

#[test]
fn replace_merge_substitutes_node_fields() {
    let store = Store::new();
    store.dispatch(Action::SetNode {
        layer: "main".into(),
        node: Node::new("n1").with("a", json!(1)),
    });
    store.dispatch(Action::MergeOverwrite {
        graph: graph_with(
            "n1",
            EntityValue::Data(Node::new("n1").with("b", json!(2))),
        ),
        target: "main".into(),
    });

    store.select(|state| {
        let node = state["main"].graph.nodes["n1"].as_data().unwrap().clone();
        assert_eq!(node.field("a"), None);
        assert_eq!(node.field("b"), Some(&json!(2)));
    });
}

#[test]
fn merging_a_layer_leaves_the_source_untouched() {
    let store = Store::new();
    store.dispatch(Action::SetNode {
        layer: "draft".into(),
        node: Node::new("n1"),
    });
    store.dispatch(Action::Merge {
        source: MergeSource::Layer("draft".into()),
        target: "main".into(),
    });

    store.select(|state| {
        assert!(state["draft"].graph.nodes["n1"].is_present());
        assert!(state["main"].graph.nodes["n1"].is_present());
    });
}
