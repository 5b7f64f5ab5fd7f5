//! Store contracts consumed by the services, plus SQLite implementations.
//!
//! # Responsibility
//! - Define the user and note store interfaces.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Read paths reject invalid persisted state instead of masking it.
//! - Unique-constraint failures surface as `RepoError::UniqueViolation`.

use crate::db::DbError;
use rusqlite::{ffi, Connection};
use thiserror::Error;

pub mod note_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for store persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    #[error("required table `{0}` is missing")]
    MissingRequiredTable(&'static str),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::SqliteFailure(err, message)
                if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Self::UniqueViolation(message.clone().unwrap_or_else(|| err.to_string()))
            }
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for &table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
