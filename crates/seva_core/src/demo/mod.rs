use time::{Duration, OffsetDateTime};

use crate::domain::{Category, Complaint, Priority, Status, StatusHistoryEntry};
use crate::ids::generate_complaint_id;
use crate::routing::{department_for, estimate_resolution};

struct DemoSeed {
    title: &'static str,
    description: &'static str,
    category: Category,
    priority: Priority,
    owner: &'static str,
    days_ago: i64,
    /// Statuses applied after the initial submission, one per day.
    progression: &'static [(Status, &'static str)],
}

fn demo_seeds() -> Vec<DemoSeed> {
    vec![
        DemoSeed {
            title: "Street light not working near bus stand",
            description: "The street light opposite the main bus stand has been out for a week, the stretch is unsafe after dark.",
            category: Category::Electricity,
            priority: Priority::High,
            owner: "demo-user-1",
            days_ago: 9,
            progression: &[
                (Status::UnderReview, "Forwarded to the area lineman"),
                (Status::InProgress, "Replacement fixture ordered"),
                (Status::Resolved, "New LED fixture installed"),
            ],
        },
        DemoSeed {
            title: "Garbage not collected in ward 12",
            description: "Door-to-door collection has skipped our lane for four days and the corner bin is overflowing.",
            category: Category::Sanitation,
            priority: Priority::Medium,
            owner: "demo-user-1",
            days_ago: 6,
            progression: &[
                (Status::UnderReview, "Shared with the sanitation contractor"),
                (Status::InProgress, "Extra pickup scheduled"),
            ],
        },
        DemoSeed {
            title: "Large pothole on station road",
            description: "A deep pothole near the railway crossing is damaging two-wheelers and slowing traffic badly.",
            category: Category::Infrastructure,
            priority: Priority::Urgent,
            owner: "demo-user-2",
            days_ago: 5,
            progression: &[(Status::UnderReview, "Site inspection scheduled")],
        },
        DemoSeed {
            title: "Low water pressure in mornings",
            description: "Supply pressure in the old market area drops to a trickle between 6 and 9 in the morning.",
            category: Category::Water,
            priority: Priority::Medium,
            owner: "demo-user-2",
            days_ago: 4,
            progression: &[],
        },
        DemoSeed {
            title: "Broken benches in school playground",
            description: "Most benches in the government school playground are broken and have exposed nails.",
            category: Category::Education,
            priority: Priority::Low,
            owner: "demo-user-3",
            days_ago: 3,
            progression: &[(
                Status::Rejected,
                "Falls under the school trust, not the municipal body",
            )],
        },
        DemoSeed {
            title: "Bus shelter roof leaking",
            description: "Rainwater pours through the shelter roof on the hospital route, commuters have nowhere to stand.",
            category: Category::Transport,
            priority: Priority::High,
            owner: "demo-user-3",
            days_ago: 1,
            progression: &[],
        },
    ]
}

/// Deterministic bootstrap dataset written on first run so the complaint
/// screens and the admin dashboard have something to show. Content is fixed;
/// only ids and timestamps derive from the seeding instant.
pub fn demo_complaints(now: OffsetDateTime) -> Vec<Complaint> {
    demo_seeds()
        .into_iter()
        .map(|seed| {
            let created_at = now - Duration::days(seed.days_ago);
            let mut history = vec![StatusHistoryEntry {
                status: Status::Submitted,
                timestamp: created_at,
                note: "Complaint submitted".to_string(),
            }];
            for (i, (status, note)) in seed.progression.iter().enumerate() {
                history.push(StatusHistoryEntry {
                    status: *status,
                    timestamp: created_at + Duration::days(i as i64 + 1),
                    note: (*note).to_string(),
                });
            }
            let status = history.last().map(|e| e.status).unwrap_or(Status::Submitted);
            let updated_at = history
                .last()
                .map(|e| e.timestamp)
                .unwrap_or(created_at);

            Complaint {
                id: generate_complaint_id(created_at),
                owner_id: seed.owner.to_string(),
                title: seed.title.to_string(),
                description: seed.description.to_string(),
                category: seed.category,
                priority: seed.priority,
                status,
                assigned_department: department_for(seed.category).to_string(),
                estimated_resolution: estimate_resolution(seed.category, seed.priority, created_at),
                history,
                created_at,
                updated_at,
            }
        })
        .collect()
}
