//! In-memory session cache.
//!
//! # Responsibility
//! - Map opaque bearer tokens to the user snapshot taken at login.
//! - Issue, resolve and revoke tokens from concurrent request handlers.
//!
//! # Invariants
//! - One mutex guards the whole map; every operation takes it exactly once.
//! - A token never maps to two different users. An issue that would
//!   overwrite another user's entry fails with `TokenCollision`.
//! - Entries live until revoked or the process exits. The cookie carries the
//!   only expiry hint; the cache itself never evicts.

use crate::auth::hasher::{CredentialHasher, HashError};
use crate::model::user::User;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error("session token already belongs to another user")]
    TokenCollision,
}

/// Process-wide token -> user mapping.
///
/// Created once at startup and shared by `Arc` between the auth gate and
/// the login/logout handlers.
pub struct SessionCache {
    hasher: Arc<dyn CredentialHasher>,
    entries: Mutex<HashMap<String, User>>,
    issued: AtomicU64,
}

impl SessionCache {
    /// Creates an empty cache deriving tokens through `hasher`.
    pub fn new(hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            hasher,
            entries: Mutex::new(HashMap::new()),
            issued: AtomicU64::new(0),
        }
    }

    /// Issues a new token for `user` stamped with the current time.
    pub fn issue(&self, user: &User) -> Result<String, SessionError> {
        self.issue_at(user, Utc::now())
    }

    /// Issues a new token for `user` stamped with `now`.
    ///
    /// Token material is `login + password_digest + unix_seconds`, followed
    /// by a per-cache issue counter so two logins of the same user within
    /// one second still get distinct tokens.
    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<String, SessionError> {
        let sequence = self.issued.fetch_add(1, Ordering::Relaxed);
        let material = format!(
            "{}{}{}:{sequence}",
            user.login,
            user.password_digest,
            now.timestamp()
        );
        let token = self.hasher.hash(&material)?;

        let mut entries = self.entries();
        match entries.entry(token) {
            Entry::Occupied(entry) if entry.get().id != user.id => {
                warn!(
                    "event=session_issue module=auth status=error error_code=token_collision user_id={}",
                    user.id
                );
                Err(SessionError::TokenCollision)
            }
            Entry::Occupied(entry) => Ok(entry.key().clone()),
            Entry::Vacant(entry) => {
                let token = entry.key().clone();
                entry.insert(user.clone());
                info!(
                    "event=session_issue module=auth status=ok user_id={} active_sessions={}",
                    user.id,
                    entries.len()
                );
                Ok(token)
            }
        }
    }

    /// Resolves `token` to the user snapshot stored at issue time.
    pub fn lookup(&self, token: &str) -> Option<User> {
        self.entries().get(token).cloned()
    }

    /// Removes `token`. Returns whether an entry existed.
    pub fn revoke(&self, token: &str) -> bool {
        let mut entries = self.entries();
        match entries.remove(token) {
            Some(user) => {
                info!(
                    "event=session_revoke module=auth status=ok user_id={} active_sessions={}",
                    user.id,
                    entries.len()
                );
                true
            }
            None => false,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, User>> {
        // The map holds no cross-entry invariant a panicking writer could break.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
