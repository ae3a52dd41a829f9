//! Namespace bookkeeping.
//!
//! Maps namespace names to non-owning subscriber handles. The registry
//! never owns a subscriber: entries hold `Weak` references, the
//! registering application controls lifetime, and a handle that no longer
//! upgrades is treated as a routing miss.

use crate::traits::NamespaceSubscriber;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

/// The default/root namespace.
pub const ROOT_NAMESPACE: &str = "/";

/// What removing a namespace implies for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    /// Last namespace or the root was removed: tear the whole session down.
    Full,
    /// Only a scoped DISCONNECT is needed; the transport stays open.
    Scoped,
}

struct Entry {
    subscriber: Weak<dyn NamespaceSubscriber>,
    active: bool,
}

/// Registry of namespace subscribers, shared between the client handle and
/// the connection task.
#[derive(Default)]
pub struct NamespaceRegistry {
    entries: RwLock<HashMap<String, Entry>>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber for `namespace`, overwriting any existing one.
    pub fn register(&self, namespace: impl Into<String>, subscriber: &Arc<dyn NamespaceSubscriber>) {
        let namespace = namespace.into();
        debug!(%namespace, "registering namespace subscriber");
        self.entries.write().insert(
            namespace,
            Entry {
                subscriber: Arc::downgrade(subscriber),
                active: false,
            },
        );
    }

    /// Resolve the live subscriber for `namespace`, if any.
    pub fn lookup(&self, namespace: &str) -> Option<Arc<dyn NamespaceSubscriber>> {
        let entries = self.entries.read();
        let entry = entries.get(namespace)?;
        let subscriber = entry.subscriber.upgrade();
        if subscriber.is_none() {
            debug!(namespace, "subscriber handle is gone");
        }
        subscriber
    }

    /// Mark a namespace as acknowledged by the server.
    pub fn mark_active(&self, namespace: &str) -> bool {
        match self.entries.write().get_mut(namespace) {
            Some(entry) => {
                entry.active = true;
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, namespace: &str) -> bool {
        self.entries
            .read()
            .get(namespace)
            .map(|entry| entry.active)
            .unwrap_or(false)
    }

    /// Remove `namespace` and decide how the session must react.
    ///
    /// Removing the root, or draining the registry, means the physical
    /// connection has no reason to stay up.
    pub fn unregister(&self, namespace: &str) -> Teardown {
        let mut entries = self.entries.write();
        entries.remove(namespace);
        if namespace == ROOT_NAMESPACE || entries.is_empty() {
            Teardown::Full
        } else {
            Teardown::Scoped
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Fan `on_socket_closed` out to every live subscriber.
    pub fn notify_closed(&self) {
        // Collect first so no callback runs under the lock.
        let subscribers: Vec<Arc<dyn NamespaceSubscriber>> = self
            .entries
            .read()
            .values()
            .filter_map(|entry| entry.subscriber.upgrade())
            .collect();
        for subscriber in subscribers {
            subscriber.on_socket_closed();
        }
    }
}
