//! Render-ready note projections.
//!
//! # Invariants
//! - Output order equals input order; storage owns sorting.
//! - Absent description/deadline render as empty strings, never `null`.
//! - Dates render as `YYYY-MM-DD`.

use crate::model::note::{Note, NoteId, DATE_FORMAT};
use crate::model::user::UserId;
use crate::view::lifecycle::{classify, CategoryStyle, NoteCategory, StatusTransition};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One note card on the list page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteView {
    pub id: NoteId,
    pub user_id: UserId,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub deadline: String,
    pub is_completed: bool,
    pub category: NoteCategory,
    pub category_label: &'static str,
    pub style: CategoryStyle,
    pub style_class: &'static str,
    pub next_transition: StatusTransition,
    pub next_transition_label: &'static str,
}

/// Prefilled values for the note update form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteEditView {
    pub id: NoteId,
    pub name: String,
    pub description: String,
    pub has_deadline: bool,
    pub deadline: String,
    pub is_completed: bool,
}

/// Projects one note at instant `now`.
pub fn project_note(note: &Note, now: DateTime<Utc>) -> NoteView {
    let classification = classify(note.is_completed, note.deadline, now);
    NoteView {
        id: note.id,
        user_id: note.user_id,
        name: note.name.clone(),
        description: note.description.clone().unwrap_or_default(),
        created_at: note.created_at.format(DATE_FORMAT).to_string(),
        deadline: format_deadline(note),
        is_completed: note.is_completed,
        category: classification.category,
        category_label: classification.category.label(),
        style: classification.style,
        style_class: classification.style.css_class(),
        next_transition: classification.next_transition,
        next_transition_label: classification.next_transition.label(),
    }
}

/// Projects `notes` in order at instant `now`.
pub fn project_notes(notes: &[Note], now: DateTime<Utc>) -> Vec<NoteView> {
    notes.iter().map(|note| project_note(note, now)).collect()
}

/// Builds the update form projection.
pub fn project_edit(note: &Note) -> NoteEditView {
    NoteEditView {
        id: note.id,
        name: note.name.clone(),
        description: note.description.clone().unwrap_or_default(),
        has_deadline: note.deadline.is_some(),
        deadline: format_deadline(note),
        is_completed: note.is_completed,
    }
}

fn format_deadline(note: &Note) -> String {
    note.deadline
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}
