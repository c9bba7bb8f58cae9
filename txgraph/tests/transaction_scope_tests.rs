//! Tests for the two-phase transaction scope: commit, callbacks,
//! notifications, changelog and conflict retry

#[path = "testutils/mod.rs"]
mod testutils;

use std::sync::Arc;

use testutils::flaky_store::FlakyStore;
use testutils::test_fixture::TestFixture;
use txgraph::schema::{DataType, NoopValidator, PropertyDefinition, TypeDefinition};
use txgraph::txn::{ChangelogVerb, ModificationEvent};
use txgraph::{
    EngineConfig, EntityHooks, ExecutionError, GraphCoordinator, MemoryGraphStore, Node,
    RetryPolicy, SchemaRegistry, SecurityContext, ServiceContext, TransactionScope, Value,
};

fn fast_retry(max_attempts: u32) -> EngineConfig {
    EngineConfig::default().with_retry(RetryPolicy {
        max_attempts,
        initial_backoff_ms: 1,
        max_backoff_ms: 2,
        jitter: false,
    })
}

#[test]
fn test_empty_scope_round_trip() {
    let fixture = TestFixture::new();

    let mut scope = fixture.coordinator.begin(&TestFixture::admin()).unwrap();
    assert!(scope.modifications().unwrap().is_empty());
    scope.success().unwrap();
    scope.close().unwrap();

    assert_eq!(fixture.listener.notification_count(), 0);
    assert!(fixture.coordinator.changelog().unwrap().is_empty());
}

#[test]
fn test_listeners_are_notified_once_with_all_events() {
    let fixture = TestFixture::new();

    let mut scope = fixture.coordinator.begin(&TestFixture::admin()).unwrap();
    scope.create_node(Node::new("a", "Person")).unwrap();
    scope.create_node(Node::new("b", "Person")).unwrap();
    scope.success().unwrap();
    scope.close().unwrap();

    let calls = fixture.listener.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 2);
    assert!(calls[0].iter().all(|event| event.is_created()));
    assert!(calls[0]
        .iter()
        .all(|event| event.principal.as_deref() == Some("admin")));
}

#[test]
fn test_notifications_can_be_disabled() {
    let fixture = TestFixture::new();

    let quiet = TestFixture::admin().with_transaction_notifications(false);
    fixture
        .coordinator
        .run_in_transaction(&quiet, |scope| scope.create_node(Node::new("a", "Person")))
        .unwrap();

    let mut scope = TransactionScope::with_options(
        fixture.coordinator.services().clone(),
        TestFixture::admin(),
        true,
        true,
        false,
    )
    .begin()
    .unwrap();
    scope.create_node(Node::new("b", "Person")).unwrap();
    scope.success().unwrap();
    scope.close().unwrap();

    assert_eq!(fixture.listener.notification_count(), 0);
    assert!(fixture.node_exists("a"));
    assert!(fixture.node_exists("b"));
    assert_eq!(fixture.coordinator.changelog().unwrap().len(), 2);
}

#[test]
fn test_close_without_success_rolls_back() {
    let fixture = TestFixture::new();

    let mut scope = fixture.coordinator.begin(&TestFixture::admin()).unwrap();
    scope.create_node(Node::new("a", "Person")).unwrap();
    scope.close().unwrap();

    assert!(!fixture.node_exists("a"));
    assert_eq!(fixture.listener.notification_count(), 0);
    assert!(fixture.coordinator.changelog().unwrap().is_empty());
}

#[test]
fn test_validation_failure_aborts_scope() {
    let schema = SchemaRegistry::new().with_type(
        TypeDefinition::new("Person")
            .with_property(PropertyDefinition::new("name", DataType::String).required()),
    );
    let fixture = TestFixture::with_schema(schema);

    let mut scope = fixture.coordinator.begin(&TestFixture::admin()).unwrap();
    scope.create_node(Node::new("a", "Person")).unwrap();
    scope
        .create_node(Node::new("b", "Person").with_property("name", "Bob"))
        .unwrap();

    let result = scope.success();
    match result {
        Err(ExecutionError::ValidationError(message)) => {
            assert!(message.contains("Person[a].name"));
            assert!(!message.contains("[b]"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    drop(scope);

    assert!(!fixture.node_exists("a"));
    assert!(!fixture.node_exists("b"));
}

#[test]
fn test_validation_can_be_disabled_by_config() {
    let schema = SchemaRegistry::new().with_type(
        TypeDefinition::new("Person")
            .with_property(PropertyDefinition::new("name", DataType::String).required()),
    );
    let fixture = TestFixture::with_config(schema, EngineConfig::relaxed());

    fixture
        .coordinator
        .run_in_transaction(&TestFixture::admin(), |scope| {
            scope.create_node(Node::new("a", "Person"))
        })
        .unwrap();

    assert!(fixture.node_exists("a"));
    // relaxed config also disables the changelog
    assert!(fixture.coordinator.changelog().unwrap().is_empty());
}

#[test]
fn test_custom_validator_replaces_schema_checks() {
    testutils::init_logging();
    let store = MemoryGraphStore::new();
    let schema = SchemaRegistry::new().with_type(
        TypeDefinition::new("Person")
            .with_property(PropertyDefinition::new("name", DataType::String).required()),
    );
    let services = ServiceContext::new(
        Arc::new(store.clone()),
        Arc::new(schema),
        EngineConfig::default(),
    )
    .with_validator(Arc::new(NoopValidator));
    let coordinator = GraphCoordinator::from_services(Arc::new(services));

    coordinator
        .run_in_transaction(&TestFixture::admin(), |scope| {
            scope.create_node(Node::new("a", "Person"))
        })
        .unwrap();

    assert!(store.node("a").is_some());
}

struct ActivateOnCreate;

impl EntityHooks for ActivateOnCreate {
    fn after_creation(
        &self,
        scope: &mut TransactionScope,
        event: &ModificationEvent,
    ) -> Result<(), ExecutionError> {
        let key = scope
            .services()
            .schema()
            .property_key(&event.entity_type, "status")?;
        scope.set_node_property(&event.entity.id, &key, Value::from("active"))
    }
}

#[test]
fn test_outer_callbacks_run_in_nested_scope() {
    let fixture = TestFixture::new();
    fixture
        .coordinator
        .register_hooks("Person", Arc::new(ActivateOnCreate));

    fixture
        .coordinator
        .run_in_transaction(&TestFixture::admin(), |scope| {
            scope.create_node(Node::new("a", "Person"))
        })
        .unwrap();

    let node = fixture.store.node("a").unwrap();
    assert_eq!(node.get_property("status"), Some(&Value::from("active")));

    // Modifications made by callbacks are neither logged nor re-notified
    let changelog = fixture.coordinator.changelog().unwrap();
    let verbs: Vec<ChangelogVerb> = changelog.iter().map(|entry| entry.verb).collect();
    assert_eq!(verbs, vec![ChangelogVerb::Create]);
    assert_eq!(fixture.listener.notification_count(), 1);
}

#[test]
fn test_scope_without_callbacks_skips_post_commit_phase() {
    let fixture = TestFixture::new();

    let mut scope = TransactionScope::with_options(
        fixture.coordinator.services().clone(),
        TestFixture::admin(),
        true,
        false,
        true,
    )
    .begin()
    .unwrap();
    scope.create_node(Node::new("a", "Person")).unwrap();
    scope.success().unwrap();
    scope.close().unwrap();

    assert!(fixture.node_exists("a"));
    assert_eq!(fixture.listener.notification_count(), 0);
    assert!(fixture.coordinator.changelog().unwrap().is_empty());
}

/// Creates a companion node of the same type for every created node
struct AuditOnCreate;

impl EntityHooks for AuditOnCreate {
    fn after_creation(
        &self,
        scope: &mut TransactionScope,
        event: &ModificationEvent,
    ) -> Result<(), ExecutionError> {
        let audit = Node::new(format!("{}-audit", event.entity.id), &event.entity_type);
        scope.create_node(audit).map(|_| ())
    }
}

#[test]
fn test_callback_writes_do_not_start_another_post_commit_phase() {
    let inner = MemoryGraphStore::new();
    let flaky = FlakyStore::new(inner.clone(), 0, 0);
    let fixture = TestFixture::with_store(
        Arc::new(flaky.clone()),
        inner,
        SchemaRegistry::new(),
        fast_retry(3),
    );
    fixture
        .coordinator
        .register_hooks("Person", Arc::new(AuditOnCreate));

    fixture
        .coordinator
        .run_in_transaction(&TestFixture::admin(), |scope| {
            scope.create_node(Node::new("a", "Person"))
        })
        .unwrap();

    // The scope itself and one nested scope, nothing for the audit node
    assert_eq!(flaky.commit_attempts(), 2);
    assert!(fixture.node_exists("a"));
    assert!(fixture.node_exists("a-audit"));
    assert!(!fixture.node_exists("a-audit-audit"));

    let targets: Vec<String> = fixture
        .coordinator
        .changelog()
        .unwrap()
        .into_iter()
        .map(|entry| entry.target.id)
        .collect();
    assert_eq!(targets, vec!["a".to_string()]);
    assert_eq!(fixture.listener.notification_count(), 1);
}

#[test]
fn test_concurrent_commit_conflicts() {
    let fixture = TestFixture::new();
    fixture
        .seed(vec![Node::new("a", "Person")], vec![])
        .unwrap();

    let key = fixture
        .coordinator
        .services()
        .schema()
        .property_key("Person", "name")
        .unwrap();

    let mut first = fixture.coordinator.begin(&TestFixture::admin()).unwrap();
    let mut second = fixture.coordinator.begin(&TestFixture::admin()).unwrap();
    first.set_node_property("a", &key, Value::from("first")).unwrap();
    second.set_node_property("a", &key, Value::from("second")).unwrap();

    first.success().unwrap();
    first.close().unwrap();

    let result = second.success();
    assert!(matches!(result, Err(ExecutionError::Conflict(_))));
    drop(second);

    assert_eq!(
        fixture.store.node("a").unwrap().get_property("name"),
        Some(&Value::from("first"))
    );
}

#[test]
fn test_post_commit_phase_retries_on_conflict() {
    let inner = MemoryGraphStore::new();
    // First commit is the scope itself, the next two nested commits conflict
    let flaky = FlakyStore::new(inner.clone(), 1, 2);
    let fixture = TestFixture::with_store(
        Arc::new(flaky.clone()),
        inner,
        SchemaRegistry::new(),
        fast_retry(10),
    );

    let mut scope = fixture.coordinator.begin(&TestFixture::admin()).unwrap();
    scope.create_node(Node::new("a", "Person")).unwrap();
    scope.success().unwrap();
    scope.close().unwrap();

    assert_eq!(flaky.commit_attempts(), 4);
    assert!(fixture.node_exists("a"));
    assert_eq!(fixture.listener.notification_count(), 1);
    assert_eq!(fixture.coordinator.changelog().unwrap().len(), 1);
}

#[test]
fn test_post_commit_retry_is_bounded() {
    let inner = MemoryGraphStore::new();
    let flaky = FlakyStore::new(inner.clone(), 1, 100);
    let fixture = TestFixture::with_store(
        Arc::new(flaky.clone()),
        inner,
        SchemaRegistry::new(),
        fast_retry(3),
    );

    let mut scope = fixture.coordinator.begin(&TestFixture::admin()).unwrap();
    scope.create_node(Node::new("a", "Person")).unwrap();
    scope.success().unwrap();
    let result = scope.close();

    assert_eq!(result, Err(ExecutionError::RetryExhausted { attempts: 3 }));
    assert_eq!(flaky.commit_attempts(), 4);

    // The first phase is committed, the changelog never made it
    assert!(fixture.node_exists("a"));
    assert!(fixture.coordinator.changelog().unwrap().is_empty());
    assert_eq!(fixture.listener.notification_count(), 1);
}

#[test]
fn test_commit_conflict_in_success_propagates() {
    let inner = MemoryGraphStore::new();
    let flaky = FlakyStore::new(inner.clone(), 0, 1);
    let fixture = TestFixture::with_store(
        Arc::new(flaky),
        inner,
        SchemaRegistry::new(),
        fast_retry(10),
    );

    let security = SecurityContext::anonymous();
    let result = fixture
        .coordinator
        .run_in_transaction(&security, |scope| scope.create_node(Node::new("a", "Person")));

    assert!(matches!(result, Err(ExecutionError::Conflict(_))));
    assert!(!fixture.node_exists("a"));
    assert_eq!(fixture.listener.notification_count(), 0);
}
