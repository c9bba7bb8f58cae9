// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction listeners
//!
//! Listeners are notified once per committed transaction with the
//! modification events it produced.

use parking_lot::RwLock;
use std::sync::Arc;

use super::modification::ModificationEvent;
use crate::security::SecurityContext;

/// Observer of committed modifications
pub trait TransactionListener: Send + Sync {
    fn after_commit(&self, security: &SecurityContext, events: &[ModificationEvent]);
}

/// Listener collection owned by a service context
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<Vec<Arc<dyn TransactionListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: Arc<dyn TransactionListener>) {
        self.listeners.write().push(listener);
    }

    /// Remove a listener by identity
    pub fn unregister(&self, listener: &Arc<dyn TransactionListener>) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Dispatch events to every registered listener
    pub fn notify(&self, security: &SecurityContext, events: &[ModificationEvent]) {
        // Snapshot so listeners may register further listeners
        let listeners: Vec<Arc<dyn TransactionListener>> = self.listeners.read().clone();
        log::debug!(
            "Notifying {} listeners of {} modifications",
            listeners.len(),
            events.len()
        );
        for listener in listeners {
            listener.after_commit(security, events);
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Counting {
        calls: Mutex<Vec<usize>>,
    }

    impl TransactionListener for Counting {
        fn after_commit(&self, _security: &SecurityContext, events: &[ModificationEvent]) {
            self.calls.lock().push(events.len());
        }
    }

    #[test]
    fn test_register_notify_unregister() {
        let registry = ListenerRegistry::new();
        let counting = Arc::new(Counting::default());
        let listener: Arc<dyn TransactionListener> = counting.clone();

        registry.register(listener.clone());
        registry.notify(&SecurityContext::anonymous(), &[]);
        assert_eq!(*counting.calls.lock(), vec![0]);

        assert!(registry.unregister(&listener));
        assert!(registry.is_empty());
        registry.notify(&SecurityContext::anonymous(), &[]);
        assert_eq!(counting.calls.lock().len(), 1);
    }
}
