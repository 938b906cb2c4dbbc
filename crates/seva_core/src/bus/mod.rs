use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::Status;

/// What a subscriber learns about a ledger mutation. The contract is "the
/// snapshot may have changed, re-read it" — events carry identifiers for
/// alerting, never a diff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    Created {
        complaint_id: String,
    },
    StatusChanged {
        complaint_id: String,
        new_status: Status,
        note: String,
    },
    /// Another execution context rewrote the persisted slot; the local
    /// snapshot has been reloaded wholesale.
    SnapshotReplaced,
}

pub type SubscriptionId = u64;

type Callback = Box<dyn Fn(&ChangeEvent)>;

/// In-process subscribe/unsubscribe registry. Every local mutation publishes
/// synchronously, after the persistence write has completed.
#[derive(Default)]
pub struct ChangeBus {
    next_id: SubscriptionId,
    subscribers: Vec<(SubscriptionId, Callback)>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, callback: impl Fn(&ChangeEvent) + 'static) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver to every subscriber in registration order. A panicking
    /// subscriber is caught and logged; delivery continues to the rest.
    pub fn publish(&self, event: &ChangeEvent) {
        for (id, callback) in &self.subscribers {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                warn!(subscription = *id, ?event, "change subscriber panicked; continuing delivery");
            }
        }
    }
}

pub type ContextId = u64;

/// A context's end of the cross-context change signal. The flag is raised by
/// writes from *other* contexts only; the owning context drains it and
/// re-reads the persisted snapshot.
#[derive(Clone)]
pub struct ContextHandle {
    id: ContextId,
    flag: Arc<AtomicBool>,
}

impl ContextHandle {
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// True when another context has written since the last drain. Clears
    /// the flag.
    pub fn take_signal(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}

/// Abstraction over whatever change signal the host environment offers
/// (storage events, file watches, nothing at all). The ledger assumes only
/// this interface, not a transport.
pub trait CrossContextSignal {
    fn register(&self) -> ContextHandle;

    /// Announce a persisted write made by `origin`. By construction the
    /// origin context must NOT observe its own announcement; local callers
    /// are served by the in-process [`ChangeBus`] instead.
    fn raise(&self, origin: ContextId);
}

/// Signal for single-context deployments: registration succeeds, the flag
/// is simply never raised.
#[derive(Default)]
pub struct NoopSignal;

impl NoopSignal {
    pub fn new() -> Self {
        Self
    }
}

impl CrossContextSignal for NoopSignal {
    fn register(&self) -> ContextHandle {
        ContextHandle {
            id: 0,
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    fn raise(&self, _origin: ContextId) {}
}

/// Shared in-process signal for several contexts over one host store: each
/// registered context gets a flag, and a raise sets every flag except the
/// origin's. Stands in for the host's storage-change event, which has the
/// same asymmetry.
#[derive(Clone, Default)]
pub struct SharedSignal {
    next_id: Arc<AtomicU64>,
    contexts: Arc<Mutex<HashMap<ContextId, Arc<AtomicBool>>>>,
}

impl SharedSignal {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CrossContextSignal for SharedSignal {
    fn register(&self) -> ContextHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let flag = Arc::new(AtomicBool::new(false));
        self.contexts.lock().unwrap().insert(id, flag.clone());
        ContextHandle { id, flag }
    }

    fn raise(&self, origin: ContextId) {
        for (id, flag) in self.contexts.lock().unwrap().iter() {
            if *id != origin {
                flag.store(true, Ordering::SeqCst);
            }
        }
    }
}
