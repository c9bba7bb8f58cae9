//! Tests for the built-in maintenance commands

#[path = "testutils/mod.rs"]
mod testutils;

use testutils::test_fixture::TestFixture;
use txgraph::schema::TypeDefinition;
use txgraph::{
    CommandArguments, Edge, EngineConfig, ExecutionError, Node, SchemaRegistry, Value,
};

fn social_graph(fixture: &TestFixture) {
    fixture
        .seed(
            vec![
                Node::new("alice", "Person"),
                Node::new("bob", "Person"),
                Node::new("carol", "Person"),
                Node::new("acme", "Company"),
            ],
            vec![
                Edge::new("k1", "alice", "bob", "KNOWS").with_property("since", 2019i64),
                Edge::new("k2", "bob", "carol", "KNOWS").with_property("since", 2021i64),
                Edge::new("k3", "carol", "alice", "KNOWS").untracked(),
                Edge::new("w1", "alice", "acme", "WORKS_AT").with_property("since", 2015i64),
            ],
        )
        .unwrap();
}

#[test]
fn test_set_relationship_properties_on_one_type() {
    let fixture = TestFixture::new();
    social_graph(&fixture);

    let args = CommandArguments::new()
        .with("type", "KNOWS")
        .with("weight", 5i64);
    let count = fixture
        .coordinator
        .run_maintenance("setRelationshipProperties", &TestFixture::admin(), &args)
        .unwrap();

    // Untracked relationships are skipped but still counted
    assert_eq!(count, 3);
    for id in ["k1", "k2"] {
        let edge = fixture.store.edge(id).unwrap();
        assert_eq!(edge.get_property("weight"), Some(&Value::from(5i64)));
    }
    assert_eq!(fixture.store.edge("k3").unwrap().get_property("weight"), None);
    assert_eq!(fixture.store.edge("w1").unwrap().get_property("weight"), None);
}

#[test]
fn test_set_relationship_properties_requires_a_property() {
    let fixture = TestFixture::new();
    social_graph(&fixture);
    let version = fixture.store.version();

    let args = CommandArguments::new().with("type", "KNOWS");
    let result =
        fixture
            .coordinator
            .run_maintenance("setRelationshipProperties", &TestFixture::admin(), &args);

    assert!(matches!(result, Err(ExecutionError::ArgumentError(_))));
    assert_eq!(fixture.store.version(), version);
}

#[test]
fn test_copy_relationship_property() {
    let fixture = TestFixture::new();
    social_graph(&fixture);

    let args = CommandArguments::new()
        .with("sourceKey", "since")
        .with("destKey", "startedAt");
    let count = fixture
        .coordinator
        .run_maintenance("copyRelationshipProperty", &TestFixture::admin(), &args)
        .unwrap();

    assert_eq!(count, 4);
    assert_eq!(
        fixture.store.edge("k1").unwrap().get_property("startedAt"),
        Some(&Value::from(2019i64))
    );
    assert_eq!(
        fixture.store.edge("w1").unwrap().get_property("startedAt"),
        Some(&Value::from(2015i64))
    );
    // Source values are kept
    assert_eq!(
        fixture.store.edge("w1").unwrap().get_property("since"),
        Some(&Value::from(2015i64))
    );
    assert_eq!(fixture.store.edge("k3").unwrap().get_property("startedAt"), None);
}

#[test]
fn test_copy_relationship_property_with_type_filter() {
    let fixture = TestFixture::new();
    social_graph(&fixture);

    let args = CommandArguments::new()
        .with("sourceKey", "since")
        .with("destKey", "startedAt")
        .with("type", "WORKS_AT");
    let count = fixture
        .coordinator
        .run_maintenance("copyRelationshipProperty", &TestFixture::admin(), &args)
        .unwrap();

    assert_eq!(count, 1);
    assert!(fixture.store.edge("w1").unwrap().get_property("startedAt").is_some());
    assert!(fixture.store.edge("k1").unwrap().get_property("startedAt").is_none());
}

#[test]
fn test_copy_relationship_property_missing_arguments() {
    let fixture = TestFixture::new();
    social_graph(&fixture);
    let version = fixture.store.version();

    for args in [
        CommandArguments::new().with("sourceKey", "since"),
        CommandArguments::new().with("destKey", "startedAt"),
        CommandArguments::new().with("sourceKey", 1i64).with("destKey", "startedAt"),
    ] {
        let result =
            fixture
                .coordinator
                .run_maintenance("copyRelationshipProperty", &TestFixture::admin(), &args);
        assert!(matches!(result, Err(ExecutionError::ArgumentError(_))));
    }

    assert_eq!(fixture.store.version(), version);
}

fn labelled_schema() -> SchemaRegistry {
    SchemaRegistry::new()
        .with_type(TypeDefinition::new("Principal"))
        .with_type(TypeDefinition::new("Person").extends("Principal"))
}

#[test]
fn test_create_labels_is_idempotent() {
    let fixture = TestFixture::with_schema(labelled_schema());
    fixture
        .seed(
            vec![
                Node::new("alice", "Person").with_labels(vec!["Person".to_string(), "Stale".to_string()]),
                Node::new("bob", "Person"),
            ],
            vec![],
        )
        .unwrap();

    let args = CommandArguments::new();
    let expected = vec!["Person".to_string(), "Principal".to_string()];

    for _ in 0..2 {
        let count = fixture
            .coordinator
            .run_maintenance("createLabels", &TestFixture::admin(), &args)
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(fixture.store.node("alice").unwrap().labels, expected);
        assert_eq!(fixture.store.node("bob").unwrap().labels, expected);
    }

    // Label changes are not modifications
    assert_eq!(fixture.listener.notification_count(), 1);
}

#[test]
fn test_create_labels_keeps_unused_labels_on_request() {
    let fixture = TestFixture::with_schema(labelled_schema());
    fixture
        .seed(
            vec![
                Node::new("alice", "Person").with_labels(vec!["Stale".to_string()]),
                Node::new("acme", "Company").with_labels(vec![]),
            ],
            vec![],
        )
        .unwrap();

    let args = CommandArguments::new()
        .with("type", "Person")
        .with("removeUnused", false);
    let count = fixture
        .coordinator
        .run_maintenance("createLabels", &TestFixture::admin(), &args)
        .unwrap();

    assert_eq!(count, 1);
    assert_eq!(
        fixture.store.node("alice").unwrap().labels,
        vec![
            "Stale".to_string(),
            "Person".to_string(),
            "Principal".to_string()
        ]
    );
    assert!(fixture.store.node("acme").unwrap().labels.is_empty());
}

#[test]
fn test_set_node_properties() {
    let fixture = TestFixture::new();
    social_graph(&fixture);

    let args = CommandArguments::new()
        .with("type", "Person")
        .with("active", true);
    let count = fixture
        .coordinator
        .run_maintenance("setNodeProperties", &TestFixture::admin(), &args)
        .unwrap();

    assert_eq!(count, 3);
    for id in ["alice", "bob", "carol"] {
        assert_eq!(
            fixture.store.node(id).unwrap().get_property("active"),
            Some(&Value::from(true))
        );
    }
    assert_eq!(fixture.store.node("acme").unwrap().get_property("active"), None);
}

#[test]
fn test_commands_run_in_small_batches() {
    let fixture = TestFixture::with_config(
        SchemaRegistry::new(),
        EngineConfig::default().with_batch_size(2),
    );
    social_graph(&fixture);
    let seeded = fixture.listener.notification_count();

    let args = CommandArguments::new().with("visited", true);
    let count = fixture
        .coordinator
        .run_maintenance("setNodeProperties", &TestFixture::admin(), &args)
        .unwrap();

    assert_eq!(count, 4);
    assert_eq!(fixture.listener.notification_count() - seeded, 2);
}

#[test]
fn test_unknown_command() {
    let fixture = TestFixture::new();
    let result = fixture.coordinator.run_maintenance(
        "dropEverything",
        &TestFixture::admin(),
        &CommandArguments::new(),
    );
    assert!(matches!(result, Err(ExecutionError::ArgumentError(_))));
}
