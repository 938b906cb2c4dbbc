use std::collections::HashSet;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use time::macros::datetime;

use seva_core::bus::NoopSignal;
use seva_core::domain::{Category, NewComplaint, Priority, Status};
use seva_core::error::LedgerError;
use seva_core::ledger::{Clock, ComplaintLedger, LedgerConfig, ManualClock};
use seva_core::store::{MemorySlot, SNAPSHOT_KEY};

fn open_ledger(slot: MemorySlot, clock: ManualClock) -> ComplaintLedger {
    ComplaintLedger::open(
        Arc::new(slot),
        Arc::new(NoopSignal::new()),
        LedgerConfig::bare(),
        Box::new(clock),
    )
    .expect("open ledger")
}

fn pothole_input() -> NewComplaint {
    NewComplaint {
        title: "Pothole on Main Rd".to_string(),
        description: "Large pothole causing accidents".to_string(),
        category: Category::Infrastructure,
        priority: Priority::High,
    }
}

#[test]
fn create_files_a_submitted_complaint_with_routing_applied() {
    let clock = ManualClock::starting_at(datetime!(2026-04-10 08:30:00 UTC));
    let mut ledger = open_ledger(MemorySlot::new(), clock.clone());

    let complaint = ledger.create(pothole_input(), "user-1").expect("create");

    assert_eq!(complaint.status, Status::Submitted);
    assert_eq!(complaint.history.len(), 1);
    assert_eq!(complaint.owner_id, "user-1");
    assert_eq!(complaint.assigned_department, "लोक निर्माण विभाग");
    // infrastructure base 14 days * high multiplier 0.5.
    assert_eq!(complaint.estimated_resolution.days, 7);
    assert_eq!(complaint.created_at, clock.now());
    assert_eq!(complaint.updated_at, complaint.created_at);
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.get(&complaint.id), Some(&complaint));
}

#[test]
fn created_ids_are_distinct() {
    let clock = ManualClock::starting_at(datetime!(2026-04-10 08:30:00 UTC));
    let mut ledger = open_ledger(MemorySlot::new(), clock);

    let mut ids = HashSet::new();
    for _ in 0..25 {
        let complaint = ledger.create(pothole_input(), "user-1").expect("create");
        ids.insert(complaint.id);
    }
    assert_eq!(ids.len(), 25);
}

#[test]
fn invalid_input_mutates_nothing() {
    let clock = ManualClock::starting_at(datetime!(2026-04-10 08:30:00 UTC));
    let slot = MemorySlot::new();
    let mut ledger = open_ledger(slot.clone(), clock);

    ledger.create(pothole_input(), "user-1").expect("create");
    let stored_before = slot.raw(SNAPSHOT_KEY);

    let err = ledger
        .create(
            NewComplaint {
                title: String::new(),
                ..pothole_input()
            },
            "user-1",
        )
        .unwrap_err();

    let LedgerError::Validation(errors) = &err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "title");

    assert_eq!(ledger.len(), 1, "snapshot size unchanged");
    assert_eq!(slot.raw(SNAPSHOT_KEY), stored_before, "stored bytes unchanged");
}

#[test]
fn validation_aggregates_every_broken_field() {
    let clock = ManualClock::starting_at(datetime!(2026-04-10 08:30:00 UTC));
    let mut ledger = open_ledger(MemorySlot::new(), clock);

    let err = ledger
        .create(
            NewComplaint {
                title: "Bad".to_string(),
                description: "short".to_string(),
                category: Category::Water,
                priority: Priority::Low,
            },
            "user-1",
        )
        .unwrap_err();

    let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["title", "description"]);
}

#[test]
fn rejected_write_surfaces_and_rolls_back_the_insert() {
    let clock = ManualClock::starting_at(datetime!(2026-04-10 08:30:00 UTC));
    let slot = MemorySlot::new();
    let mut ledger = open_ledger(slot.clone(), clock);

    ledger.create(pothole_input(), "user-1").expect("create");
    let stored_before = slot.raw(SNAPSHOT_KEY);

    slot.set_fail_writes(true);
    let err = ledger.create(pothole_input(), "user-1").unwrap_err();
    assert!(matches!(err, LedgerError::StoreWrite(_)), "got {err:?}");

    // The in-memory snapshot must not claim durability the store refused.
    assert_eq!(ledger.len(), 1);
    assert_eq!(slot.raw(SNAPSHOT_KEY), stored_before);
}

#[test]
fn unique_id_verification_accepts_creates_under_strict_config() {
    let clock = ManualClock::starting_at(datetime!(2026-04-10 08:30:00 UTC));
    let mut ledger = ComplaintLedger::open(
        Arc::new(MemorySlot::new()),
        Arc::new(NoopSignal::new()),
        LedgerConfig::strict(),
        Box::new(clock),
    )
    .expect("open ledger");

    // Same clock instant for every create; uniqueness rests on regeneration.
    let mut ids = HashSet::new();
    for _ in 0..10 {
        ids.insert(ledger.create(pothole_input(), "user-1").expect("create").id);
    }
    assert_eq!(ids.len(), 10);
}
