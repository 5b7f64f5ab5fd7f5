//! User store contract and SQLite implementation.

use crate::model::user::{User, UserId};
use crate::repo::{ensure_tables, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Storage interface for registered users.
pub trait UserStore {
    /// Exact match on login and stored digest.
    fn find_by_credentials(&self, login: &str, password_digest: &str) -> RepoResult<Option<User>>;
    /// Exact match on login.
    fn find_by_login(&self, login: &str) -> RepoResult<Option<User>>;
    /// Inserts a user; a taken login fails with `RepoError::UniqueViolation`.
    fn create(&self, login: &str, password_digest: &str) -> RepoResult<UserId>;
}

/// SQLite-backed user store.
pub struct SqliteUserStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["users"])?;
        Ok(Self { conn })
    }
}

impl UserStore for SqliteUserStore<'_> {
    fn find_by_credentials(
        &self,
        login: &str,
        password_digest: &str,
    ) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, login, password_digest
                 FROM users
                 WHERE login = ?1 AND password_digest = ?2;",
                params![login, password_digest],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn find_by_login(&self, login: &str) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, login, password_digest FROM users WHERE login = ?1;",
                [login],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn create(&self, login: &str, password_digest: &str) -> RepoResult<UserId> {
        self.conn.execute(
            "INSERT INTO users (login, password_digest) VALUES (?1, ?2);",
            params![login, password_digest],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        login: row.get("login")?,
        password_digest: row.get("password_digest")?,
    })
}
