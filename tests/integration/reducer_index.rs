//! Forward/reverse edge index symmetry under every mutating action.

use strata::entity::EntityValue;
use strata::store::{Action, Store};
use strata::types::EdgeKind;
use strata::Node;

use super::test_utils::meta;
use serde_json::json;

fn kind() -> EdgeKind {
    EdgeKind::new("fromType", "toType")
}

fn index_is_symmetric(store: &Store, layer: &str) -> bool {
    store.select(|state| {
        let graph = &state[layer].graph;
        for (from_type, from_ids) in &graph.edges {
            for (from_id, to_types) in from_ids {
                for (to_type, to_ids) in to_types {
                    let kind = EdgeKind::new(from_type.clone(), to_type.clone());
                    for (to_id, forward) in to_ids {
                        let reverse = graph.reverse_edge(&kind, to_id, from_id);
                        let forward_present = !forward.is_absent();
                        let reverse_present = reverse.map_or(false, |r| !r.is_absent());
                        if forward_present != reverse_present {
                            return false;
                        }
                        if forward.is_tombstone()
                            != reverse.map_or(false, |r| r.is_tombstone())
                        {
                            return false;
                        }
                    }
                }
            }
        }
        true
    })
}

#[test]
fn index_stays_symmetric_across_action_sequences() {
    let store = Store::new();
    let actions = vec![
        Action::Add {
            layer: "g1".into(),
            kind: kind(),
            from_id: "f1".into(),
            to_node: Node::new("n1"),
            metadata: EntityValue::Data(meta(&[("v", json!(1))])),
        },
        Action::Assoc {
            layer: "g1".into(),
            kind: kind(),
            from_id: "f1".into(),
            to_id: "n2".into(),
            metadata: EntityValue::Marker,
        },
        Action::Dissoc {
            layer: "g1".into(),
            kind: kind(),
            from_id: "f1".into(),
            to_id: "n2".into(),
        },
        Action::Remove {
            layer: "g1".into(),
            kind: kind(),
            from_id: "f1".into(),
            to_id: "n1".into(),
        },
        Action::Add {
            layer: "g1".into(),
            kind: kind(),
            from_id: "f2".into(),
            to_node: Node::new("n1"),
            metadata: EntityValue::Marker,
        },
    ];

    for action in actions {
        store.dispatch(action);
        assert!(index_is_symmetric(&store, "g1"));
    }
}

#[test]
fn add_then_remove_ends_in_tombstones_on_all_three_paths() {
    let store = Store::new();
    store.dispatch(Action::Add {
        layer: "g1".into(),
        kind: kind(),
        from_id: "f1".into(),
        to_node: Node::new("n1"),
        metadata: EntityValue::Data(meta(&[("v", json!(1))])),
    });
    store.dispatch(Action::Remove {
        layer: "g1".into(),
        kind: kind(),
        from_id: "f1".into(),
        to_id: "n1".into(),
    });

    store.select(|state| {
        let graph = &state["g1"].graph;
        assert_eq!(graph.nodes["n1"], EntityValue::Tombstone);
        assert_eq!(
            graph.edge(&kind(), "f1", "n1"),
            Some(&EntityValue::Tombstone)
        );
        assert_eq!(
            graph.reverse_edge(&kind(), "n1", "f1"),
            Some(&EntityValue::Tombstone)
        );
    });
}

#[test]
fn re_adding_a_removed_edge_restores_both_sides() {
    let store = Store::new();
    for action in [
        Action::Add {
            layer: "g1".into(),
            kind: kind(),
            from_id: "f1".into(),
            to_node: Node::new("n1"),
            metadata: EntityValue::Marker,
        },
        Action::Remove {
            layer: "g1".into(),
            kind: kind(),
            from_id: "f1".into(),
            to_id: "n1".into(),
        },
        Action::Add {
            layer: "g1".into(),
            kind: kind(),
            from_id: "f1".into(),
            to_node: Node::new("n1"),
            metadata: EntityValue::Marker,
        },
    ] {
        store.dispatch(action);
    }

    store.select(|state| {
        let graph = &state["g1"].graph;
        assert!(graph.edge(&kind(), "f1", "n1").unwrap().is_present());
        assert!(graph
            .reverse_edge(&kind(), "n1", "f1")
            .unwrap()
            .is_present());
    });
}
