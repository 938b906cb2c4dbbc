use std::sync::Arc;

use pretty_assertions::assert_eq;
use time::macros::datetime;
use time::Duration;

use seva_core::bus::NoopSignal;
use seva_core::domain::{Category, NewComplaint, Priority, Status};
use seva_core::error::LedgerError;
use seva_core::ledger::{
    ComplaintLedger, ConcurrencyMode, LedgerConfig, ManualClock, TransitionPolicy,
};
use seva_core::store::{MemorySlot, SNAPSHOT_KEY};

fn open_ledger(slot: MemorySlot, clock: ManualClock, config: LedgerConfig) -> ComplaintLedger {
    ComplaintLedger::open(
        Arc::new(slot),
        Arc::new(NoopSignal::new()),
        config,
        Box::new(clock),
    )
    .expect("open ledger")
}

fn streetlight_input() -> NewComplaint {
    NewComplaint {
        title: "Street light out in lane 4".to_string(),
        description: "Whole lane is dark after sunset, light pole number 17".to_string(),
        category: Category::Electricity,
        priority: Priority::Medium,
    }
}

#[test]
fn resolving_an_in_progress_complaint_appends_exactly_one_entry() {
    let clock = ManualClock::starting_at(datetime!(2026-04-12 10:00:00 UTC));
    let mut ledger = open_ledger(MemorySlot::new(), clock.clone(), LedgerConfig::bare());

    let id = ledger.create(streetlight_input(), "user-1").expect("create").id;
    clock.advance(Duration::hours(2));
    ledger.transition(&id, Status::UnderReview, None).expect("review");
    clock.advance(Duration::hours(2));
    ledger.transition(&id, Status::InProgress, None).expect("progress");

    let before = ledger.get(&id).expect("exists").clone();
    clock.advance(Duration::minutes(30));

    let after = ledger
        .transition(&id, Status::Resolved, Some("Fixed"))
        .expect("resolve");

    assert_eq!(after.status, Status::Resolved);
    assert_eq!(after.history.len(), before.history.len() + 1);
    assert!(after.updated_at > before.updated_at, "updated_at must strictly increase");
    assert_eq!(after.history.last().unwrap().note, "Fixed");
    assert_eq!(after.created_at, before.created_at);
}

#[test]
fn transition_without_note_uses_the_status_default() {
    let clock = ManualClock::starting_at(datetime!(2026-04-12 10:00:00 UTC));
    let mut ledger = open_ledger(MemorySlot::new(), clock.clone(), LedgerConfig::bare());

    let id = ledger.create(streetlight_input(), "user-1").expect("create").id;
    clock.advance(Duration::hours(1));
    let complaint = ledger
        .transition(&id, Status::UnderReview, None)
        .expect("review");

    assert_eq!(
        complaint.history.last().unwrap().note,
        "Complaint taken up for review"
    );
}

#[test]
fn unknown_id_returns_not_found_and_leaves_the_snapshot_alone() {
    let clock = ManualClock::starting_at(datetime!(2026-04-12 10:00:00 UTC));
    let slot = MemorySlot::new();
    let mut ledger = open_ledger(slot.clone(), clock, LedgerConfig::bare());

    ledger.create(streetlight_input(), "user-1").expect("create");
    let stored_before = slot.raw(SNAPSHOT_KEY);

    let err = ledger
        .transition("does-not-exist", Status::Resolved, None)
        .unwrap_err();

    assert_eq!(
        err,
        LedgerError::NotFound {
            id: "does-not-exist".to_string()
        }
    );
    assert_eq!(slot.raw(SNAPSHOT_KEY), stored_before);
}

#[test]
fn reapplying_the_same_status_records_two_entries() {
    let clock = ManualClock::starting_at(datetime!(2026-04-12 10:00:00 UTC));
    let mut ledger = open_ledger(MemorySlot::new(), clock.clone(), LedgerConfig::bare());

    let id = ledger.create(streetlight_input(), "user-1").expect("create").id;
    clock.advance(Duration::minutes(5));
    ledger
        .transition(&id, Status::UnderReview, Some("first look"))
        .expect("first");
    clock.advance(Duration::minutes(5));
    ledger
        .transition(&id, Status::UnderReview, Some("second look"))
        .expect("second");

    let complaint = ledger.get(&id).expect("exists");
    assert_eq!(complaint.history.len(), 3);
    let last_two: Vec<Status> = complaint.history[1..].iter().map(|e| e.status).collect();
    // Every change request is a recorded event, even with an unchanged value.
    assert_eq!(last_two, vec![Status::UnderReview, Status::UnderReview]);
}

#[test]
fn history_is_append_only_across_transitions() {
    let clock = ManualClock::starting_at(datetime!(2026-04-12 10:00:00 UTC));
    let mut ledger = open_ledger(MemorySlot::new(), clock.clone(), LedgerConfig::bare());

    let id = ledger.create(streetlight_input(), "user-1").expect("create").id;
    let mut prior_history = ledger.get(&id).expect("exists").history.clone();

    for status in [Status::UnderReview, Status::InProgress, Status::Resolved] {
        clock.advance(Duration::hours(1));
        let complaint = ledger.transition(&id, status, None).expect("transition");
        assert_eq!(
            &complaint.history[..prior_history.len()],
            &prior_history[..],
            "existing entries must never change"
        );
        assert_eq!(complaint.history.len(), prior_history.len() + 1);
        prior_history = complaint.history;
    }
}

#[test]
fn permissive_baseline_accepts_any_status_jump() {
    let clock = ManualClock::starting_at(datetime!(2026-04-12 10:00:00 UTC));
    let mut ledger = open_ledger(MemorySlot::new(), clock.clone(), LedgerConfig::bare());

    let id = ledger.create(streetlight_input(), "user-1").expect("create").id;
    clock.advance(Duration::minutes(1));
    ledger.transition(&id, Status::Closed, None).expect("close");
    clock.advance(Duration::minutes(1));
    // The faithful baseline restricts nothing, even leaving a terminal state.
    let complaint = ledger
        .transition(&id, Status::Submitted, Some("reopened by admin"))
        .expect("reopen");
    assert_eq!(complaint.status, Status::Submitted);
}

#[test]
fn strict_policy_enforces_the_progression_table() {
    let clock = ManualClock::starting_at(datetime!(2026-04-12 10:00:00 UTC));
    let config = LedgerConfig {
        transition_policy: TransitionPolicy::Strict,
        concurrency: ConcurrencyMode::LastWriterWins,
        ..LedgerConfig::bare()
    };
    let mut ledger = open_ledger(MemorySlot::new(), clock.clone(), config);

    let id = ledger.create(streetlight_input(), "user-1").expect("create").id;
    clock.advance(Duration::minutes(1));

    // Skipping review is not allowed.
    let err = ledger.transition(&id, Status::InProgress, None).unwrap_err();
    assert_eq!(
        err,
        LedgerError::IllegalTransition {
            from: Status::Submitted,
            to: Status::InProgress
        }
    );

    // The chain itself goes through, and terminal states admit nothing.
    ledger.transition(&id, Status::UnderReview, None).expect("review");
    ledger.transition(&id, Status::InProgress, None).expect("progress");
    ledger.transition(&id, Status::Resolved, None).expect("resolve");
    ledger.transition(&id, Status::Closed, None).expect("close");

    let err = ledger.transition(&id, Status::InProgress, None).unwrap_err();
    assert_eq!(
        err,
        LedgerError::IllegalTransition {
            from: Status::Closed,
            to: Status::InProgress
        }
    );
}

#[test]
fn strict_policy_allows_rejection_from_any_non_terminal_state() {
    let clock = ManualClock::starting_at(datetime!(2026-04-12 10:00:00 UTC));
    let config = LedgerConfig {
        transition_policy: TransitionPolicy::Strict,
        ..LedgerConfig::bare()
    };
    let mut ledger = open_ledger(MemorySlot::new(), clock, config);

    let id = ledger.create(streetlight_input(), "user-1").expect("create").id;
    ledger
        .transition(&id, Status::Rejected, Some("duplicate of an open complaint"))
        .expect("reject straight from submitted");
}

#[test]
fn rejected_write_rolls_back_the_transition() {
    let clock = ManualClock::starting_at(datetime!(2026-04-12 10:00:00 UTC));
    let slot = MemorySlot::new();
    let mut ledger = open_ledger(slot.clone(), clock.clone(), LedgerConfig::bare());

    let id = ledger.create(streetlight_input(), "user-1").expect("create").id;
    let before = ledger.get(&id).expect("exists").clone();

    slot.set_fail_writes(true);
    clock.advance(Duration::minutes(1));
    let err = ledger.transition(&id, Status::UnderReview, None).unwrap_err();
    assert!(matches!(err, LedgerError::StoreWrite(_)), "got {err:?}");

    assert_eq!(ledger.get(&id), Some(&before));
}
