//! Note lifecycle classification.
//!
//! # Invariants
//! - `classify` is pure and total: every input maps to one category.
//! - Rules are evaluated in order: completed, expired, active.
//! - A deadline only expires once the whole deadline day (UTC) has passed,
//!   i.e. when `now > deadline 00:00 UTC + 24h`.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

/// Grace window added to a deadline date before it reads as expired.
pub const DEADLINE_GRACE_HOURS: i64 = 24;

/// Derived lifecycle state of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteCategory {
    Active,
    Completed,
    Expired,
}

impl NoteCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Expired => "Expired",
        }
    }
}

/// Rendering style tag paired with a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryStyle {
    Primary,
    Success,
    Danger,
}

impl CategoryStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Success => "success",
            Self::Danger => "danger",
        }
    }

    /// CSS classes used by the note card templates.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Primary => "text-white bg-primary",
            Self::Success => "text-white bg-success",
            Self::Danger => "text-white bg-danger",
        }
    }
}

/// Status change a user can invoke on a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTransition {
    Complete,
    ReturnToActive,
}

impl StatusTransition {
    pub fn label(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::ReturnToActive => "return to active",
        }
    }

    /// Completion flag after applying this transition.
    pub fn target_completed(self) -> bool {
        matches!(self, Self::Complete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: NoteCategory,
    pub style: CategoryStyle,
    pub next_transition: StatusTransition,
}

/// Classifies a note from its stored fields at instant `now`.
pub fn classify(
    is_completed: bool,
    deadline: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> Classification {
    if is_completed {
        return Classification {
            category: NoteCategory::Completed,
            style: CategoryStyle::Success,
            next_transition: StatusTransition::ReturnToActive,
        };
    }

    if deadline.is_some_and(|date| now > expires_at(date)) {
        return Classification {
            category: NoteCategory::Expired,
            style: CategoryStyle::Danger,
            next_transition: StatusTransition::Complete,
        };
    }

    Classification {
        category: NoteCategory::Active,
        style: CategoryStyle::Primary,
        next_transition: StatusTransition::Complete,
    }
}

/// Last instant at which a note with `deadline` still reads as active.
pub fn expires_at(deadline: NaiveDate) -> DateTime<Utc> {
    deadline.and_time(NaiveTime::MIN).and_utc() + Duration::hours(DEADLINE_GRACE_HOURS)
}
