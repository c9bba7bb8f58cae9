//! Store wrapper that fails selected commits with a conflict

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use txgraph::storage::{GraphStore, StorageError, StoreResult, StoreTransaction};
use txgraph::txn::{ChangelogEntry, ModificationSet, TransactionId};
use txgraph::{Edge, MemoryGraphStore, Node};

#[derive(Debug)]
struct CommitPlan {
    seen: AtomicUsize,
    skip: usize,
    fail: usize,
}

impl CommitPlan {
    fn should_fail(&self) -> bool {
        let n = self.seen.fetch_add(1, Ordering::SeqCst);
        n >= self.skip && n < self.skip + self.fail
    }
}

/// Lets the first `skip` commits through, then fails the next `fail`
#[derive(Debug, Clone)]
pub struct FlakyStore {
    inner: MemoryGraphStore,
    plan: Arc<CommitPlan>,
}

impl FlakyStore {
    pub fn new(inner: MemoryGraphStore, skip: usize, fail: usize) -> Self {
        Self {
            inner,
            plan: Arc::new(CommitPlan {
                seen: AtomicUsize::new(0),
                skip,
                fail,
            }),
        }
    }

    /// Number of commits attempted so far
    pub fn commit_attempts(&self) -> usize {
        self.plan.seen.load(Ordering::SeqCst)
    }
}

impl GraphStore for FlakyStore {
    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(FlakyTransaction {
            inner: self.inner.begin()?,
            plan: Arc::clone(&self.plan),
        }))
    }

    fn node_ids(&self, node_type: Option<&str>) -> StoreResult<Vec<String>> {
        self.inner.node_ids(node_type)
    }

    fn edge_ids(&self, edge_type: Option<&str>) -> StoreResult<Vec<String>> {
        self.inner.edge_ids(edge_type)
    }

    fn changelog(&self) -> StoreResult<Vec<ChangelogEntry>> {
        self.inner.changelog()
    }
}

struct FlakyTransaction {
    inner: Box<dyn StoreTransaction>,
    plan: Arc<CommitPlan>,
}

impl StoreTransaction for FlakyTransaction {
    fn id(&self) -> TransactionId {
        self.inner.id()
    }

    fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    fn get_node(&self, id: &str) -> StoreResult<Node> {
        self.inner.get_node(id)
    }

    fn get_edge(&self, id: &str) -> StoreResult<Edge> {
        self.inner.get_edge(id)
    }

    fn outgoing_edges(&self, node_id: &str) -> StoreResult<Vec<Edge>> {
        self.inner.outgoing_edges(node_id)
    }

    fn incoming_edges(&self, node_id: &str) -> StoreResult<Vec<Edge>> {
        self.inner.incoming_edges(node_id)
    }

    fn node_ids(&self, node_type: Option<&str>) -> StoreResult<Vec<String>> {
        self.inner.node_ids(node_type)
    }

    fn edge_ids(&self, edge_type: Option<&str>) -> StoreResult<Vec<String>> {
        self.inner.edge_ids(edge_type)
    }

    fn create_node(&mut self, node: Node) -> StoreResult<()> {
        self.inner.create_node(node)
    }

    fn create_edge(&mut self, edge: Edge) -> StoreResult<()> {
        self.inner.create_edge(edge)
    }

    fn update_node(&mut self, node: Node) -> StoreResult<()> {
        self.inner.update_node(node)
    }

    fn update_edge(&mut self, edge: Edge) -> StoreResult<()> {
        self.inner.update_edge(edge)
    }

    fn delete_node(&mut self, id: &str, force: bool) -> StoreResult<()> {
        self.inner.delete_node(id, force)
    }

    fn delete_edge(&mut self, id: &str) -> StoreResult<()> {
        self.inner.delete_edge(id)
    }

    fn is_node_deleted(&self, id: &str) -> bool {
        self.inner.is_node_deleted(id)
    }

    fn append_changelog(&mut self, entries: Vec<ChangelogEntry>) {
        self.inner.append_changelog(entries)
    }

    fn modifications(&self) -> &ModificationSet {
        self.inner.modifications()
    }

    fn modifications_mut(&mut self) -> &mut ModificationSet {
        self.inner.modifications_mut()
    }

    fn commit(&mut self) -> StoreResult<()> {
        if self.plan.should_fail() {
            return Err(StorageError::Conflict {
                transaction: self.inner.id().to_string(),
                entity: "injected".to_string(),
            });
        }
        self.inner.commit()
    }

    fn finish(self: Box<Self>) -> Option<ModificationSet> {
        self.inner.finish()
    }
}
