//! Note domain model and form validation.
//!
//! # Responsibility
//! - Define the persisted note record.
//! - Turn raw form input into a validated draft before any store call.
//!
//! # Invariants
//! - `deadline` is a calendar date without time-of-day.
//! - A draft always carries a non-empty trimmed name.

use crate::model::user::UserId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage-assigned note identifier.
pub type NoteId = i64;

/// Calendar format used for deadlines on the wire and at render time.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Persisted note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deadline: Option<NaiveDate>,
    pub is_completed: bool,
}

/// Validated fields for creating or fully replacing a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub name: String,
    pub description: Option<String>,
    pub deadline: Option<NaiveDate>,
}

/// Raw note form input as submitted by the page.
///
/// Fields are untrimmed; `has_deadline` mirrors the deadline checkbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteForm {
    pub name: String,
    pub description: String,
    pub has_deadline: bool,
    pub deadline: String,
}

/// Validation failures reported back to the form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteValidationError {
    #[error("note name and description must not be empty")]
    EmptyField,
    #[error("deadline date is required")]
    MissingDeadline,
    #[error("invalid deadline date `{0}`; expected YYYY-MM-DD")]
    InvalidDeadline(String),
    #[error("invalid note id `{0}`")]
    InvalidNoteId(String),
}

impl NoteForm {
    /// Validates form input and produces a draft.
    ///
    /// The deadline text is ignored unless `has_deadline` is set.
    pub fn validate(&self) -> Result<NoteDraft, NoteValidationError> {
        let name = self.name.trim();
        let description = self.description.trim();
        if name.is_empty() || description.is_empty() {
            return Err(NoteValidationError::EmptyField);
        }

        let deadline = if self.has_deadline {
            Some(parse_deadline(&self.deadline)?)
        } else {
            None
        };

        Ok(NoteDraft {
            name: name.to_string(),
            description: Some(description.to_string()),
            deadline,
        })
    }
}

/// Parses a `YYYY-MM-DD` deadline; blank input is `MissingDeadline`.
pub fn parse_deadline(raw: &str) -> Result<NaiveDate, NoteValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NoteValidationError::MissingDeadline);
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| NoteValidationError::InvalidDeadline(trimmed.to_string()))
}

/// Parses a note ID taken from a path segment or hidden form field.
pub fn parse_note_id(raw: &str) -> Result<NoteId, NoteValidationError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<NoteId>()
        .map_err(|_| NoteValidationError::InvalidNoteId(trimmed.to_string()))
}
