use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::domain::Complaint;
use crate::error::LedgerError;

/// Fixed key the ledger snapshot lives under in the host store.
pub const SNAPSHOT_KEY: &str = "seva.complaints";

/// Version tag written into the persisted envelope.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Failure reported by the host key-value primitive.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct SlotError(pub String);

/// The host persistent key-value primitive: a flat string-to-string store
/// outside this crate's control. One slot holds the whole ledger snapshot.
pub trait SlotStore {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError>;
    fn write(&self, key: &str, value: &str) -> Result<(), SlotError>;
}

/// In-memory slot store. Cloning shares the underlying map, so one instance
/// can back several ledger contexts the way a browser's storage backs
/// several tabs. Also the store used by core tests.
#[derive(Clone, Default)]
pub struct MemorySlot {
    slots: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, simulating a full or revoked host
    /// store (quota exceeded). Reads keep working.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw slot contents, for asserting that a failed operation left the
    /// persisted bytes untouched.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.slots.lock().unwrap().get(key).cloned()
    }
}

impl SlotStore for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        Ok(self.slots.lock().unwrap().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SlotError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SlotError("host store rejected write (quota)".to_string()));
        }
        self.slots
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEnvelope {
    version: u32,
    revision: u64,
    complaints: Vec<Complaint>,
}

/// A parsed snapshot plus the revision counter it was stored under.
/// Revision 0 means the slot held the legacy unversioned array format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSnapshot {
    pub complaints: Vec<Complaint>,
    pub revision: u64,
}

/// What the adapter found in the slot. `Absent` (first run) and
/// `Unreadable` (corrupt slot, already logged) both leave the caller with
/// an empty ledger, but only absence triggers demo seeding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotLoad {
    Absent,
    Unreadable,
    Loaded(LoadedSnapshot),
}

/// Persistence adapter: translates between the ledger's snapshot and the
/// single serialized slot, and owns the (de)serialization failure policy.
pub struct SnapshotStore {
    slot: Arc<dyn SlotStore>,
    key: String,
}

impl SnapshotStore {
    pub fn new(slot: Arc<dyn SlotStore>) -> Self {
        Self {
            slot,
            key: SNAPSHOT_KEY.to_string(),
        }
    }

    pub fn with_key(slot: Arc<dyn SlotStore>, key: impl Into<String>) -> Self {
        Self {
            slot,
            key: key.into(),
        }
    }

    /// Load the persisted snapshot.
    ///
    /// - Absent slot: first run, caller decides about seeding.
    /// - Unparseable slot: fail closed — log and report `Unreadable` so the
    ///   application stays usable with an empty ledger. The stored data for
    ///   this device is lost; that is the accepted failure mode, not masked
    ///   corruption.
    /// - Host read failure: `StoreRead`, surfaced.
    pub fn load(&self) -> Result<SnapshotLoad, LedgerError> {
        let raw = self
            .slot
            .read(&self.key)
            .map_err(|e| LedgerError::StoreRead(e.to_string()))?;
        let Some(raw) = raw else {
            return Ok(SnapshotLoad::Absent);
        };

        if let Ok(envelope) = serde_json::from_str::<SnapshotEnvelope>(&raw) {
            return Ok(SnapshotLoad::Loaded(LoadedSnapshot {
                complaints: envelope.complaints,
                revision: envelope.revision,
            }));
        }

        // Legacy layout: a bare JSON array of complaints, no version tag.
        match serde_json::from_str::<Vec<Complaint>>(&raw) {
            Ok(complaints) => Ok(SnapshotLoad::Loaded(LoadedSnapshot {
                complaints,
                revision: 0,
            })),
            Err(e) => {
                warn!(key = %self.key, error = %e, "stored snapshot is unreadable; starting empty");
                Ok(SnapshotLoad::Unreadable)
            }
        }
    }

    /// Overwrite the slot with the full snapshot under the given revision.
    /// The host primitive offers no partial-write protection; a failed write
    /// leaves the previous value in place and must surface to the caller.
    pub fn save(&self, complaints: &[Complaint], revision: u64) -> Result<(), LedgerError> {
        let envelope = SnapshotEnvelope {
            version: SNAPSHOT_VERSION,
            revision,
            complaints: complaints.to_vec(),
        };
        let raw = serde_json::to_string(&envelope)
            .map_err(|e| LedgerError::StoreWrite(e.to_string()))?;
        self.slot
            .write(&self.key, &raw)
            .map_err(|e| LedgerError::StoreWrite(e.to_string()))
    }

    /// Revision currently persisted, for the optimistic-lock check.
    /// Absent or unreadable slots count as revision 0.
    pub fn stored_revision(&self) -> Result<u64, LedgerError> {
        Ok(match self.load()? {
            SnapshotLoad::Loaded(s) => s.revision,
            SnapshotLoad::Absent | SnapshotLoad::Unreadable => 0,
        })
    }
}
