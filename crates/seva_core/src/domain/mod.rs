use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Current position of a complaint in its lifecycle.
///
/// The persisted form is the snake_case string (`"under_review"` etc.), which
/// is also what the UI layer and the stored snapshot use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Submitted,
    UnderReview,
    InProgress,
    Resolved,
    Rejected,
    Closed,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Submitted,
        Status::UnderReview,
        Status::InProgress,
        Status::Resolved,
        Status::Rejected,
        Status::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Submitted => "submitted",
            Status::UnderReview => "under_review",
            Status::InProgress => "in_progress",
            Status::Resolved => "resolved",
            Status::Rejected => "rejected",
            Status::Closed => "closed",
        }
    }

    /// Terminal states admit no further transitions under the strict policy.
    /// `Resolved` is not terminal: a resolved complaint may still be closed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Rejected | Status::Closed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(Status::Submitted),
            "under_review" => Ok(Status::UnderReview),
            "in_progress" => Ok(Status::InProgress),
            "resolved" => Ok(Status::Resolved),
            "rejected" => Ok(Status::Rejected),
            "closed" => Ok(Status::Closed),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Complaint category, fixed at creation. Drives department assignment and
/// the resolution estimate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Infrastructure,
    Water,
    Electricity,
    Sanitation,
    Health,
    Education,
    Transport,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Infrastructure => "infrastructure",
            Category::Water => "water",
            Category::Electricity => "electricity",
            Category::Sanitation => "sanitation",
            Category::Health => "health",
            Category::Education => "education",
            Category::Transport => "transport",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complaint priority, fixed at creation. Scales the resolution estimate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded status change. History entries are append-only; entries are
/// never edited, removed, or reordered once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusHistoryEntry {
    pub status: Status,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub note: String,
}

/// Resolution projection computed once at creation from category and
/// priority. Not recomputed on later transitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EstimatedResolution {
    pub days: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub expected_date: OffsetDateTime,
}

/// Canonical complaint record held in the ledger snapshot.
///
/// Notes:
/// - `id` and `owner_id` are immutable once assigned.
/// - `history` always has at least one entry (creation writes the first).
/// - `updated_at` advances on every history append; `created_at` never moves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Complaint {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub status: Status,
    pub assigned_department: String,
    pub estimated_resolution: EstimatedResolution,
    pub history: Vec<StatusHistoryEntry>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Complaint {
    /// Latest history entry. Creation seeds the first entry and nothing ever
    /// truncates the list, so this is `None` only for hand-built records.
    pub fn latest_entry(&self) -> Option<&StatusHistoryEntry> {
        self.history.last()
    }
}

/// Creation input as received from the UI layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewComplaint {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
}

/// Single failed field constraint; creation surfaces these aggregated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
