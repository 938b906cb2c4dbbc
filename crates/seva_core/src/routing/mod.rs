use time::{Duration, OffsetDateTime};

use crate::domain::{Category, EstimatedResolution, Priority};

/// Department a complaint of the given category is routed to. Static table;
/// informational only, never user-editable.
pub fn department_for(category: Category) -> &'static str {
    match category {
        Category::Infrastructure => "लोक निर्माण विभाग",
        Category::Water => "जल आपूर्ति विभाग",
        Category::Electricity => "विद्युत विभाग",
        Category::Sanitation => "स्वच्छता विभाग",
        Category::Health => "स्वास्थ्य विभाग",
        Category::Education => "शिक्षा विभाग",
        Category::Transport => "परिवहन विभाग",
        Category::Other => "सामान्य प्रशासन विभाग",
    }
}

/// Base resolution window in days before the priority multiplier is applied.
fn base_days(category: Category) -> f64 {
    match category {
        Category::Infrastructure => 14.0,
        Category::Water => 3.0,
        Category::Electricity => 2.0,
        Category::Sanitation => 5.0,
        Category::Health => 7.0,
        Category::Education => 10.0,
        Category::Transport => 7.0,
        Category::Other => 7.0,
    }
}

/// Higher priority shrinks the window; low priority stretches it.
fn priority_multiplier(priority: Priority) -> f64 {
    match priority {
        Priority::Low => 1.5,
        Priority::Medium => 1.0,
        Priority::High => 0.5,
        Priority::Urgent => 0.25,
    }
}

/// Deterministic resolution projection: category base days scaled by the
/// priority multiplier, rounded up to whole days, never below one day.
/// Computed once at creation and not revised afterwards.
pub fn estimate_resolution(
    category: Category,
    priority: Priority,
    created_at: OffsetDateTime,
) -> EstimatedResolution {
    let days = (base_days(category) * priority_multiplier(priority)).ceil() as i64;
    let days = days.max(1);
    EstimatedResolution {
        days,
        expected_date: created_at + Duration::days(days),
    }
}
