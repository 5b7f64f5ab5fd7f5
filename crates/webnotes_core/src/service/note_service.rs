//! Note use-case service.
//!
//! # Responsibility
//! - Validate note forms before any store call.
//! - Apply the status toggle chosen by the lifecycle classifier.
//! - Produce render-ready list and edit projections.
//!
//! # Invariants
//! - `update_note` uses full replacement semantics.
//! - Listings keep storage order (`id ASC`).
//! - A blank search needle lists without filtering.
//! - Handlers reach this service only after the auth gate; note IDs are
//!   not checked against the caller's user ID.

use crate::model::note::{NoteForm, NoteId, NoteValidationError};
use crate::model::user::UserId;
use crate::repo::note_repo::{NoteStore, NoteUpdate, Page};
use crate::repo::RepoError;
use crate::view::lifecycle::{classify, StatusTransition};
use crate::view::projection::{project_edit, project_notes, NoteEditView, NoteView};
use chrono::{DateTime, Utc};
use log::info;
use thiserror::Error;

const NOTE_NOT_FOUND_MESSAGE: &str = "note not found";
const STORAGE_FAILURE_MESSAGE: &str = "something went wrong, please try again";

/// Service error for note use-cases.
#[derive(Debug, Error)]
pub enum NoteServiceError {
    #[error(transparent)]
    Validation(#[from] NoteValidationError),
    #[error("note not found: {0}")]
    NoteNotFound(NoteId),
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { id, .. } => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl NoteServiceError {
    /// Text shown next to the note form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::NoteNotFound(_) => NOTE_NOT_FOUND_MESSAGE.to_string(),
            Self::Repo(_) => STORAGE_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// One rendered page of the note list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesPage {
    pub items: Vec<NoteView>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
    pub offset: u32,
    /// Trimmed search needle, when one was applied.
    pub search: Option<String>,
}

/// Note service facade over store implementations.
pub struct NoteService<R: NoteStore> {
    repo: R,
}

impl<R: NoteStore> NoteService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a note owned by `user_id`.
    pub fn create_note(
        &self,
        user_id: UserId,
        form: &NoteForm,
    ) -> Result<NoteId, NoteServiceError> {
        self.create_note_at(user_id, form, Utc::now())
    }

    /// Creates a note owned by `user_id` with creation time `now`.
    pub fn create_note_at(
        &self,
        user_id: UserId,
        form: &NoteForm,
        now: DateTime<Utc>,
    ) -> Result<NoteId, NoteServiceError> {
        let draft = form.validate()?;
        let note_id = self.repo.create(user_id, &draft, now)?;
        info!(
            "event=note_create module=service status=ok note_id={} user_id={} has_deadline={}",
            note_id,
            user_id,
            draft.deadline.is_some()
        );
        Ok(note_id)
    }

    /// Replaces name, description, deadline and completion of a note.
    pub fn update_note(
        &self,
        note_id: NoteId,
        form: &NoteForm,
        is_completed: bool,
    ) -> Result<NoteId, NoteServiceError> {
        let draft = form.validate()?;
        let update = NoteUpdate {
            name: draft.name,
            description: draft.description,
            is_completed,
            deadline: draft.deadline,
        };
        let updated = self.repo.update(note_id, &update)?;
        info!("event=note_update module=service status=ok note_id={updated}");
        Ok(updated)
    }

    /// Applies the next transition the classifier offers for this note.
    ///
    /// Returns the transition that was applied.
    pub fn toggle_status(
        &self,
        note_id: NoteId,
        now: DateTime<Utc>,
    ) -> Result<StatusTransition, NoteServiceError> {
        let note = self
            .repo
            .find_by_id(note_id)?
            .ok_or(NoteServiceError::NoteNotFound(note_id))?;
        let transition = classify(note.is_completed, note.deadline, now).next_transition;

        let changed = self
            .repo
            .set_completion(note_id, transition.target_completed())?;
        if changed == 0 {
            return Err(NoteServiceError::NoteNotFound(note_id));
        }

        info!(
            "event=note_toggle module=service status=ok note_id={} transition={:?}",
            note_id, transition
        );
        Ok(transition)
    }

    /// Deletes a note. Unknown IDs yield `NoteNotFound`.
    pub fn delete_note(&self, note_id: NoteId) -> Result<(), NoteServiceError> {
        if self.repo.delete(note_id)? == 0 {
            return Err(NoteServiceError::NoteNotFound(note_id));
        }
        info!("event=note_delete module=service status=ok note_id={note_id}");
        Ok(())
    }

    /// Loads the update-form projection of one note.
    pub fn edit_view(&self, note_id: NoteId) -> Result<NoteEditView, NoteServiceError> {
        self.repo
            .find_by_id(note_id)?
            .map(|note| project_edit(&note))
            .ok_or(NoteServiceError::NoteNotFound(note_id))
    }

    /// Lists a user's notes, optionally filtered by a substring, projected at `now`.
    pub fn list_notes(
        &self,
        user_id: UserId,
        search: Option<&str>,
        page: Page,
        now: DateTime<Utc>,
    ) -> Result<NotesPage, NoteServiceError> {
        let search = search
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_string);

        let notes = match search.as_deref() {
            Some(needle) => self.repo.find_by_owner_and_search(user_id, needle, page)?,
            None => self.repo.find_by_owner(user_id, page)?,
        };

        Ok(NotesPage {
            items: project_notes(&notes, now),
            applied_limit: page.limit,
            offset: page.offset,
            search,
        })
    }
}
