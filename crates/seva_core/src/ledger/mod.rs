use std::sync::{Arc, Mutex};

use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::bus::{
    ChangeBus, ChangeEvent, ContextHandle, CrossContextSignal, SubscriptionId,
};
use crate::demo;
use crate::domain::{Complaint, NewComplaint, Status, StatusHistoryEntry};
use crate::error::LedgerError;
use crate::ids::generate_complaint_id;
use crate::routing::{department_for, estimate_resolution};
use crate::store::{SlotStore, SnapshotLoad, SnapshotStore};
use crate::validate::validate_new_complaint;

/// Time source for ids, history entries and `updated_at`. Injectable so
/// tests can drive it deterministically.
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Hand-driven clock. Cloning shares the instant, so a test can keep a
/// handle while the ledger owns the other.
#[derive(Clone)]
pub struct ManualClock {
    instant: Arc<Mutex<OffsetDateTime>>,
}

impl ManualClock {
    pub fn starting_at(instant: OffsetDateTime) -> Self {
        Self {
            instant: Arc::new(Mutex::new(instant)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.instant.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.instant.lock().unwrap()
    }
}

/// Which status transitions the ledger accepts.
///
/// `Permissive` is the faithful baseline: any status may follow any other.
/// `Strict` enforces the progression
/// `submitted -> under_review -> in_progress -> {resolved, rejected}` with
/// `rejected`/`closed` reachable from any non-terminal state and terminal
/// states admitting nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    #[default]
    Permissive,
    Strict,
}

impl TransitionPolicy {
    pub fn allows(&self, from: Status, to: Status) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => {
                if from.is_terminal() {
                    return false;
                }
                matches!(
                    (from, to),
                    (Status::Submitted, Status::UnderReview)
                        | (Status::UnderReview, Status::InProgress)
                        | (Status::InProgress, Status::Resolved)
                        | (_, Status::Rejected)
                        | (_, Status::Closed)
                )
            }
        }
    }
}

/// How concurrent writes from sibling contexts are handled.
///
/// `LastWriterWins` keeps the documented baseline: a stale context's full
/// snapshot write silently overwrites a newer one. `OptimisticLock` compares
/// the stored revision against the one this context last observed and
/// returns [`LedgerError::Conflict`] instead of overwriting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConcurrencyMode {
    #[default]
    LastWriterWins,
    OptimisticLock,
}

#[derive(Debug, Clone, Copy)]
pub struct LedgerConfig {
    pub transition_policy: TransitionPolicy,
    pub concurrency: ConcurrencyMode,
    /// Re-check a freshly generated id against the snapshot and regenerate
    /// on collision. Off in the baseline.
    pub verify_unique_ids: bool,
    /// Seed the demonstration dataset when the slot is absent on open.
    pub seed_demo: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            transition_policy: TransitionPolicy::Permissive,
            concurrency: ConcurrencyMode::LastWriterWins,
            verify_unique_ids: false,
            seed_demo: true,
        }
    }
}

impl LedgerConfig {
    /// Baseline behavior minus demo seeding; what most embedding tests want.
    pub fn bare() -> Self {
        Self {
            seed_demo: false,
            ..Self::default()
        }
    }

    /// Everything tightened: strict transitions, optimistic locking,
    /// id-uniqueness verification. No demo seeding.
    pub fn strict() -> Self {
        Self {
            transition_policy: TransitionPolicy::Strict,
            concurrency: ConcurrencyMode::OptimisticLock,
            verify_unique_ids: true,
            seed_demo: false,
        }
    }
}

fn default_note_for(status: Status) -> &'static str {
    match status {
        Status::Submitted => "Complaint submitted",
        Status::UnderReview => "Complaint taken up for review",
        Status::InProgress => "Work on the complaint has started",
        Status::Resolved => "Complaint resolved",
        Status::Rejected => "Complaint rejected",
        Status::Closed => "Complaint closed",
    }
}

/// The authoritative in-memory collection of complaint records for this
/// execution context, plus the machinery to persist it and tell everyone
/// it changed.
///
/// One instance per context. Every mutation runs synchronously through
/// validate -> mutate -> persist -> notify; on a failed persist the
/// in-memory mutation is rolled back, so memory never claims durability the
/// store did not provide.
pub struct ComplaintLedger {
    snapshot: Vec<Complaint>,
    revision: u64,
    store: SnapshotStore,
    bus: ChangeBus,
    signal: Arc<dyn CrossContextSignal>,
    handle: ContextHandle,
    clock: Box<dyn Clock>,
    config: LedgerConfig,
}

impl ComplaintLedger {
    /// Load (or bootstrap) the ledger from the host slot store.
    ///
    /// An absent slot means first run: with `seed_demo` set the demo dataset
    /// is written out once. An unreadable slot degrades to empty inside the
    /// adapter and is treated the same way, except that seeding is skipped
    /// to avoid burying the evidence under fresh demo rows.
    pub fn open(
        slot: Arc<dyn SlotStore>,
        signal: Arc<dyn CrossContextSignal>,
        config: LedgerConfig,
        clock: Box<dyn Clock>,
    ) -> Result<Self, LedgerError> {
        let store = SnapshotStore::new(slot);
        let handle = signal.register();

        let (snapshot, revision) = match store.load()? {
            SnapshotLoad::Loaded(loaded) => (loaded.complaints, loaded.revision),
            SnapshotLoad::Absent if config.seed_demo => {
                let seeded = demo::demo_complaints(clock.now());
                store.save(&seeded, 1)?;
                debug!(count = seeded.len(), "seeded demo complaints on first run");
                (seeded, 1)
            }
            // An unreadable slot is never reseeded; the corrupt value stays
            // put for inspection and the ledger starts empty.
            SnapshotLoad::Absent | SnapshotLoad::Unreadable => (Vec::new(), 0),
        };

        Ok(Self {
            snapshot,
            revision,
            store,
            bus: ChangeBus::new(),
            signal,
            handle,
            clock,
            config,
        })
    }

    /// File a new complaint for `owner_id`.
    ///
    /// Validation failures aggregate every broken field and leave both the
    /// snapshot and the stored bytes untouched. A failed persist likewise
    /// rolls the insert back before surfacing.
    pub fn create(
        &mut self,
        input: NewComplaint,
        owner_id: &str,
    ) -> Result<Complaint, LedgerError> {
        let errors = validate_new_complaint(&input);
        if !errors.is_empty() {
            return Err(LedgerError::Validation(errors));
        }

        let now = self.clock.now();
        let id = self.allocate_id(now);

        let complaint = Complaint {
            id: id.clone(),
            owner_id: owner_id.to_string(),
            title: input.title,
            description: input.description,
            category: input.category,
            priority: input.priority,
            status: Status::Submitted,
            assigned_department: department_for(input.category).to_string(),
            estimated_resolution: estimate_resolution(input.category, input.priority, now),
            history: vec![StatusHistoryEntry {
                status: Status::Submitted,
                timestamp: now,
                note: default_note_for(Status::Submitted).to_string(),
            }],
            created_at: now,
            updated_at: now,
        };

        self.snapshot.push(complaint.clone());
        if let Err(e) = self.persist() {
            self.snapshot.pop();
            return Err(e);
        }

        self.bus.publish(&ChangeEvent::Created {
            complaint_id: id.clone(),
        });
        self.signal.raise(self.handle.id());
        Ok(complaint)
    }

    /// Record a status change on an existing complaint.
    ///
    /// Appends a history entry and advances `status`/`updated_at`. Applying
    /// the current status again is accepted and appends another entry with
    /// the same status: every change request is a recorded event, even when
    /// the value is unchanged. Callers wanting a no-op must compare against
    /// the latest entry themselves.
    pub fn transition(
        &mut self,
        id: &str,
        new_status: Status,
        note: Option<&str>,
    ) -> Result<Complaint, LedgerError> {
        let Some(idx) = self.snapshot.iter().position(|c| c.id == id) else {
            return Err(LedgerError::NotFound { id: id.to_string() });
        };

        let from = self.snapshot[idx].status;
        if !self.config.transition_policy.allows(from, new_status) {
            return Err(LedgerError::IllegalTransition {
                from,
                to: new_status,
            });
        }

        let now = self.clock.now();
        let note = note
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(default_note_for(new_status))
            .to_string();

        let previous = self.snapshot[idx].clone();
        {
            let complaint = &mut self.snapshot[idx];
            complaint.history.push(StatusHistoryEntry {
                status: new_status,
                timestamp: now,
                note: note.clone(),
            });
            complaint.status = new_status;
            complaint.updated_at = now;
        }

        if let Err(e) = self.persist() {
            self.snapshot[idx] = previous;
            return Err(e);
        }

        let complaint = self.snapshot[idx].clone();
        self.bus.publish(&ChangeEvent::StatusChanged {
            complaint_id: complaint.id.clone(),
            new_status,
            note,
        });
        self.signal.raise(self.handle.id());
        Ok(complaint)
    }

    /// Restartable, lazily filtered read over the current snapshot, in
    /// snapshot insertion order.
    pub fn query<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a Complaint>
    where
        P: Fn(&Complaint) -> bool + 'a,
    {
        self.snapshot.iter().filter(move |c| predicate(c))
    }

    pub fn get(&self, id: &str) -> Option<&Complaint> {
        self.snapshot.iter().find(|c| c.id == id)
    }

    pub fn snapshot(&self) -> &[Complaint] {
        &self.snapshot
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// Snapshot revision this context last observed in the store.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscribe(
        &mut self,
        callback: impl Fn(&ChangeEvent) + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.bus.unsubscribe(id);
    }

    /// Drop the in-memory copy and re-read the persisted snapshot, then tell
    /// local subscribers to re-query. Called after another context's write.
    pub fn refresh(&mut self) -> Result<(), LedgerError> {
        let (snapshot, revision) = match self.store.load()? {
            SnapshotLoad::Loaded(loaded) => (loaded.complaints, loaded.revision),
            SnapshotLoad::Absent | SnapshotLoad::Unreadable => (Vec::new(), 0),
        };
        self.snapshot = snapshot;
        self.revision = revision;
        self.bus.publish(&ChangeEvent::SnapshotReplaced);
        Ok(())
    }

    /// Drain this context's cross-context signal; when another context has
    /// written, refresh and report `true`. The embedding layer calls this
    /// from its event loop when the host raises its change event.
    pub fn poll_external(&mut self) -> Result<bool, LedgerError> {
        if !self.handle.take_signal() {
            return Ok(false);
        }
        self.refresh()?;
        Ok(true)
    }

    fn allocate_id(&self, now: OffsetDateTime) -> String {
        let mut id = generate_complaint_id(now);
        if self.config.verify_unique_ids {
            while self.snapshot.iter().any(|c| c.id == id) {
                id = generate_complaint_id(now);
            }
        }
        id
    }

    /// Write the snapshot under the next revision. Under optimistic locking
    /// a stale base revision aborts with `Conflict` before anything is
    /// written; under last-writer-wins the write goes through regardless,
    /// which is the documented baseline.
    fn persist(&mut self) -> Result<(), LedgerError> {
        if self.config.concurrency == ConcurrencyMode::OptimisticLock {
            let current = self.store.stored_revision()?;
            if current != self.revision {
                return Err(LedgerError::Conflict {
                    base: self.revision,
                    current,
                });
            }
        }
        let next = self.revision + 1;
        self.store.save(&self.snapshot, next)?;
        self.revision = next;
        Ok(())
    }
}
