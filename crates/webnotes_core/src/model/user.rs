//! Registered user record.

use serde::{Deserialize, Serialize};

/// Storage-assigned user identifier.
pub type UserId = i64;

/// Identity record as stored by the user store.
///
/// Sessions keep a copy of this value taken at login time, so later changes
/// in storage never reach outstanding sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Unique login name.
    pub login: String,
    /// Output of the configured credential hasher; never rendered.
    #[serde(skip_serializing)]
    pub password_digest: String,
}

impl User {
    pub fn new(id: UserId, login: impl Into<String>, password_digest: impl Into<String>) -> Self {
        Self {
            id,
            login: login.into(),
            password_digest: password_digest.into(),
        }
    }
}
