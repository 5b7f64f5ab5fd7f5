//! Note store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide note CRUD, owner listings and substring search.
//! - Convert between SQL columns and `Note` values.
//!
//! # Invariants
//! - Owner listings are ordered by `id ASC` and always paged.
//! - `deadline_at` is stored as `YYYY-MM-DD` text; `created_at` as epoch ms.
//! - Search matches name or description, ASCII case-insensitive.

use crate::model::note::{Note, NoteDraft, NoteId, DATE_FORMAT};
use crate::model::user::UserId;
use crate::repo::{bool_to_int, ensure_tables, RepoError, RepoResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Default number of notes per page.
pub const NOTES_DEFAULT_LIMIT: u32 = 6;
/// Upper bound for any requested page size.
pub const NOTES_LIMIT_MAX: u32 = 50;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    name,
    description,
    created_at,
    deadline_at,
    is_completed
FROM notes";

/// Limit/offset window over an owner listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    /// Builds a page with a normalized limit.
    pub fn new(limit: Option<u32>, offset: u32) -> Self {
        Self {
            limit: normalize_note_limit(limit),
            offset,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, 0)
    }
}

/// Full replacement values for an existing note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteUpdate {
    pub name: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub deadline: Option<NaiveDate>,
}

/// Storage interface for notes.
pub trait NoteStore {
    fn find_by_id(&self, id: NoteId) -> RepoResult<Option<Note>>;
    fn find_by_owner(&self, user_id: UserId, page: Page) -> RepoResult<Vec<Note>>;
    fn find_by_owner_and_search(
        &self,
        user_id: UserId,
        needle: &str,
        page: Page,
    ) -> RepoResult<Vec<Note>>;
    fn create(
        &self,
        user_id: UserId,
        draft: &NoteDraft,
        created_at: DateTime<Utc>,
    ) -> RepoResult<NoteId>;
    /// Replaces all mutable fields. Unknown IDs yield `RepoError::NotFound`.
    fn update(&self, id: NoteId, update: &NoteUpdate) -> RepoResult<NoteId>;
    /// Returns the number of deleted rows (0 or 1).
    fn delete(&self, id: NoteId) -> RepoResult<usize>;
    /// Returns the number of updated rows (0 or 1).
    fn set_completion(&self, id: NoteId, is_completed: bool) -> RepoResult<usize>;
}

/// SQLite-backed note store.
pub struct SqliteNoteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["users", "notes"])?;
        Ok(Self { conn })
    }

    fn query_notes(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }
}

impl NoteStore for SqliteNoteStore<'_> {
    fn find_by_id(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let raw = stmt.query_row([id], RawNote::from_row).optional()?;
        raw.map(RawNote::into_note).transpose()
    }

    fn find_by_owner(&self, user_id: UserId, page: Page) -> RepoResult<Vec<Note>> {
        self.query_notes(
            &format!(
                "{NOTE_SELECT_SQL}
                 WHERE user_id = ?1
                 ORDER BY id ASC
                 LIMIT ?2 OFFSET ?3;"
            ),
            params![user_id, page.limit, page.offset],
        )
    }

    fn find_by_owner_and_search(
        &self,
        user_id: UserId,
        needle: &str,
        page: Page,
    ) -> RepoResult<Vec<Note>> {
        let pattern = format!("%{}%", escape_like(needle));
        self.query_notes(
            &format!(
                "{NOTE_SELECT_SQL}
                 WHERE user_id = ?1
                   AND (name LIKE ?2 ESCAPE '\\' OR description LIKE ?2 ESCAPE '\\')
                 ORDER BY id ASC
                 LIMIT ?3 OFFSET ?4;"
            ),
            params![user_id, pattern, page.limit, page.offset],
        )
    }

    fn create(
        &self,
        user_id: UserId,
        draft: &NoteDraft,
        created_at: DateTime<Utc>,
    ) -> RepoResult<NoteId> {
        self.conn.execute(
            "INSERT INTO notes (
                user_id,
                name,
                description,
                created_at,
                deadline_at,
                is_completed
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0);",
            params![
                user_id,
                draft.name.as_str(),
                draft.description.as_deref(),
                created_at.timestamp_millis(),
                draft.deadline.map(format_date),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, id: NoteId, update: &NoteUpdate) -> RepoResult<NoteId> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                name = ?1,
                description = ?2,
                is_completed = ?3,
                deadline_at = ?4
             WHERE id = ?5;",
            params![
                update.name.as_str(),
                update.description.as_deref(),
                bool_to_int(update.is_completed),
                update.deadline.map(format_date),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound { entity: "note", id });
        }
        Ok(id)
    }

    fn delete(&self, id: NoteId) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM notes WHERE id = ?1;", [id])?)
    }

    fn set_completion(&self, id: NoteId, is_completed: bool) -> RepoResult<usize> {
        Ok(self.conn.execute(
            "UPDATE notes SET is_completed = ?1 WHERE id = ?2;",
            params![bool_to_int(is_completed), id],
        )?)
    }
}

/// Normalizes list limit: `None`/0 fall back to the default, large values clamp.
pub fn normalize_note_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => NOTES_DEFAULT_LIMIT,
        Some(value) if value > NOTES_LIMIT_MAX => NOTES_LIMIT_MAX,
        Some(value) => value,
    }
}

/// Column values as read, before domain validation.
struct RawNote {
    id: NoteId,
    user_id: UserId,
    name: String,
    description: Option<String>,
    created_at: i64,
    deadline_at: Option<String>,
    is_completed: i64,
}

impl RawNote {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            created_at: row.get("created_at")?,
            deadline_at: row.get("deadline_at")?,
            is_completed: row.get("is_completed")?,
        })
    }

    fn into_note(self) -> RepoResult<Note> {
        let created_at = DateTime::from_timestamp_millis(self.created_at).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid created_at value `{}` in notes.created_at",
                self.created_at
            ))
        })?;

        let deadline = match self.deadline_at {
            Some(text) => Some(NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid deadline `{text}` in notes.deadline_at"
                ))
            })?),
            None => None,
        };

        let is_completed = match self.is_completed {
            0 => false,
            1 => true,
            other => {
                return Err(RepoError::InvalidData(format!(
                    "invalid is_completed value `{other}` in notes.is_completed"
                )));
            }
        };

        Ok(Note {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            created_at,
            deadline,
            is_completed,
        })
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    RawNote::from_row(row)?.into_note()
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{escape_like, normalize_note_limit, Page, NOTES_DEFAULT_LIMIT, NOTES_LIMIT_MAX};

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(normalize_note_limit(None), NOTES_DEFAULT_LIMIT);
        assert_eq!(normalize_note_limit(Some(0)), NOTES_DEFAULT_LIMIT);
        assert_eq!(normalize_note_limit(Some(20)), 20);
        assert_eq!(normalize_note_limit(Some(500)), NOTES_LIMIT_MAX);
        assert_eq!(Page::default(), Page { limit: 6, offset: 0 });
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
