//! Test fixture for txgraph integration tests
//!
//! Provides an isolated coordinator over a fresh in-memory store. Every
//! fixture registers a listener that records all notifications.

use parking_lot::Mutex;
use std::sync::Arc;

use txgraph::storage::GraphStore;
use txgraph::{
    EngineConfig, GraphCoordinator, MemoryGraphStore, ModificationEvent, Node, SchemaRegistry,
    SecurityContext, ServiceContext, TransactionListener,
};
use txgraph::{Edge, ExecutionError};

/// Listener that keeps every batch of events it receives
#[derive(Default)]
pub struct RecordingListener {
    calls: Mutex<Vec<Vec<ModificationEvent>>>,
}

impl RecordingListener {
    pub fn notification_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<Vec<ModificationEvent>> {
        self.calls.lock().clone()
    }
}

impl TransactionListener for RecordingListener {
    fn after_commit(&self, _security: &SecurityContext, events: &[ModificationEvent]) {
        self.calls.lock().push(events.to_vec());
    }
}

/// Test fixture with an isolated store
pub struct TestFixture {
    pub coordinator: GraphCoordinator,
    pub store: MemoryGraphStore,
    pub listener: Arc<RecordingListener>,
}

impl TestFixture {
    /// Fixture with an empty schema and default configuration
    pub fn new() -> Self {
        Self::with_schema(SchemaRegistry::new())
    }

    pub fn with_schema(schema: SchemaRegistry) -> Self {
        Self::with_config(schema, EngineConfig::default())
    }

    pub fn with_config(schema: SchemaRegistry, config: EngineConfig) -> Self {
        let store = MemoryGraphStore::new();
        Self::with_store(Arc::new(store.clone()), store, schema, config)
    }

    /// Fixture over a wrapping store; `inner` is the memory store it wraps
    pub fn with_store(
        store: Arc<dyn GraphStore>,
        inner: MemoryGraphStore,
        schema: SchemaRegistry,
        config: EngineConfig,
    ) -> Self {
        super::init_logging();

        let services = ServiceContext::new(store, Arc::new(schema), config);
        let coordinator = GraphCoordinator::from_services(Arc::new(services));
        let listener = Arc::new(RecordingListener::default());
        coordinator.register_listener(listener.clone());

        Self {
            coordinator,
            store: inner,
            listener,
        }
    }

    /// Security context of the admin user, without cascading delete
    pub fn admin() -> SecurityContext {
        SecurityContext::for_user("admin")
    }

    /// Security context of the admin user with cascading delete
    pub fn cascading_admin() -> SecurityContext {
        SecurityContext::for_user("admin").with_cascading_delete(true)
    }

    /// Commit nodes and edges in one transaction
    pub fn seed(&self, nodes: Vec<Node>, edges: Vec<Edge>) -> Result<(), ExecutionError> {
        self.coordinator
            .run_in_transaction(&SecurityContext::super_user(), |scope| {
                for node in nodes {
                    scope.create_node(node)?;
                }
                for edge in edges {
                    scope.create_relationship(edge)?;
                }
                Ok(())
            })
    }

    pub fn node_exists(&self, id: &str) -> bool {
        self.store.node(id).is_some()
    }

    /// Number of committed edges touching any of the given nodes
    pub fn edges_touching(&self, ids: &[&str]) -> usize {
        let mut edge_ids: Vec<String> = ids
            .iter()
            .flat_map(|id| self.store.connected_edges(id))
            .map(|edge| edge.id)
            .collect();
        edge_ids.sort();
        edge_ids.dedup();
        edge_ids.len()
    }
}
