use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Complaint, Status};

pub use crate::routing::{department_for, estimate_resolution};

/// Per-status complaint counts over one snapshot. Every status value is
/// present in `counts`, zero or not, so UI tiles render a stable set.
/// Invariant: the counts sum to `total`, which equals the snapshot length.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusStats {
    pub counts: BTreeMap<Status, u64>,
    pub total: u64,
}

pub fn stats_by_status(snapshot: &[Complaint]) -> StatusStats {
    let mut counts: BTreeMap<Status, u64> = Status::ALL.iter().map(|s| (*s, 0)).collect();
    for complaint in snapshot {
        *counts.entry(complaint.status).or_insert(0) += 1;
    }
    StatusStats {
        counts,
        total: snapshot.len() as u64,
    }
}

/// Complaints belonging to `owner_id`, newest first. Ties on `created_at`
/// keep snapshot insertion order (stable sort).
pub fn by_owner<'a>(snapshot: &'a [Complaint], owner_id: &str) -> Vec<&'a Complaint> {
    let mut owned: Vec<&Complaint> = snapshot
        .iter()
        .filter(|c| c.owner_id == owner_id)
        .collect();
    owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    owned
}
