use crate::domain::{FieldError, NewComplaint};

pub const TITLE_MIN_CHARS: usize = 5;
pub const DESCRIPTION_MIN_CHARS: usize = 10;

/// Check creation input against the minimum constraints. All failures are
/// aggregated so the UI can show every broken field at once; the ledger
/// rejects the whole create when this is non-empty (all-or-nothing).
///
/// Category and priority are closed enums, so "must be non-empty" is already
/// guaranteed by the type; free-form input fails at deserialization instead.
pub fn validate_new_complaint(input: &NewComplaint) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if input.title.trim().chars().count() < TITLE_MIN_CHARS {
        errors.push(FieldError::new(
            "title",
            format!("title must be at least {TITLE_MIN_CHARS} characters"),
        ));
    }

    if input.description.trim().chars().count() < DESCRIPTION_MIN_CHARS {
        errors.push(FieldError::new(
            "description",
            format!("description must be at least {DESCRIPTION_MIN_CHARS} characters"),
        ));
    }

    errors
}
