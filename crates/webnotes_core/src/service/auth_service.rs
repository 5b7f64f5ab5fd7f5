//! Registration, login and logout use-cases.
//!
//! # Responsibility
//! - Validate credential forms and hash passwords before storage.
//! - Issue and revoke session tokens and build the matching cookies.
//!
//! # Invariants
//! - Unknown login and wrong password produce the same error and message.
//! - Registration stores only the digest, never the plaintext.
//! - Logout revokes the cache entry even though the cookie is only expired
//!   client-side.

use crate::auth::gate::{
    decode_token, expired_session_cookie, session_cookie, DEFAULT_COOKIE_TTL_MINUTES,
};
use crate::auth::hasher::{CredentialHasher, HashError};
use crate::auth::session::{SessionCache, SessionError};
use crate::model::user::{User, UserId};
use crate::repo::user_repo::UserStore;
use crate::repo::RepoError;
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;

const GENERIC_FAILURE_MESSAGE: &str = "something went wrong, please try again";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login and password are required")]
    MissingCredentials,
    #[error("all fields are required")]
    IncompleteRegistration,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("invalid login or password")]
    InvalidCredentials,
    #[error("login `{0}` is already taken")]
    LoginTaken(String),
    #[error("cookie lifetime of {0} minutes overflows the session expiry")]
    CookieExpiryOverflow(i64),
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl AuthError {
    /// Text shown on the login/registration page.
    pub fn user_message(&self) -> String {
        match self {
            Self::CookieExpiryOverflow(_)
            | Self::Hash(_)
            | Self::Session(_)
            | Self::Repo(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Raw registration form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub login: String,
    pub password: String,
    pub confirm_password: String,
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSession {
    pub user: User,
    pub token: String,
    /// Value for the `Set-Cookie` response header.
    pub set_cookie: String,
}

/// Credential use-cases over a user store and the shared session cache.
pub struct AuthService<U: UserStore> {
    users: U,
    hasher: Arc<dyn CredentialHasher>,
    sessions: Arc<SessionCache>,
    cookie_ttl: Duration,
}

impl<U: UserStore> AuthService<U> {
    pub fn new(users: U, hasher: Arc<dyn CredentialHasher>, sessions: Arc<SessionCache>) -> Self {
        Self {
            users,
            hasher,
            sessions,
            cookie_ttl: Duration::minutes(DEFAULT_COOKIE_TTL_MINUTES),
        }
    }

    /// Overrides the cookie expiry hint.
    pub fn with_cookie_ttl(mut self, cookie_ttl: Duration) -> Self {
        self.cookie_ttl = cookie_ttl;
        self
    }

    /// Registers a new user from trimmed form input.
    pub fn register(&self, form: &RegisterForm) -> Result<UserId, AuthError> {
        let login = form.login.trim();
        let password = form.password.trim();
        let confirm_password = form.confirm_password.trim();

        if login.is_empty() || password.is_empty() || confirm_password.is_empty() {
            return Err(AuthError::IncompleteRegistration);
        }
        if password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        let digest = self.hasher.hash(password)?;
        let user_id = self.users.create(login, &digest).map_err(|err| match err {
            RepoError::UniqueViolation(_) => AuthError::LoginTaken(login.to_string()),
            other => AuthError::Repo(other),
        })?;

        info!(
            "event=user_register module=service status=ok user_id={} hasher={}",
            user_id,
            self.hasher.name()
        );
        Ok(user_id)
    }

    /// Verifies credentials and issues a session stamped with the current time.
    pub fn login(&self, login: &str, password: &str) -> Result<LoginSession, AuthError> {
        self.login_at(login, password, Utc::now())
    }

    /// Verifies credentials and issues a session stamped with `now`.
    pub fn login_at(
        &self,
        login: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginSession, AuthError> {
        if login.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let found = if self.hasher.is_deterministic() {
            let digest = self.hasher.hash(password)?;
            self.users.find_by_credentials(login, &digest)?
        } else {
            match self.users.find_by_login(login)? {
                Some(user) if self.verify_stored(password, &user)? => Some(user),
                _ => None,
            }
        };
        let Some(user) = found else {
            warn!("event=user_login module=service status=denied reason=invalid_credentials");
            return Err(AuthError::InvalidCredentials);
        };

        let token = self.sessions.issue_at(&user, now)?;
        let Some(set_cookie) = session_cookie(&token, now, self.cookie_ttl) else {
            self.sessions.revoke(&token);
            warn!(
                "event=user_login module=service status=error error_code=cookie_expiry_overflow user_id={}",
                user.id
            );
            return Err(AuthError::CookieExpiryOverflow(self.cookie_ttl.num_minutes()));
        };
        info!("event=user_login module=service status=ok user_id={}", user.id);
        Ok(LoginSession {
            user,
            token,
            set_cookie,
        })
    }

    /// Digests written by a different hasher cannot verify and count as a
    /// mismatch.
    fn verify_stored(&self, password: &str, user: &User) -> Result<bool, AuthError> {
        match self.hasher.verify(password, &user.password_digest) {
            Ok(matched) => Ok(matched),
            Err(HashError::MalformedDigest(_)) => {
                warn!(
                    "event=user_login module=service status=denied reason=foreign_digest user_id={} hasher={}",
                    user.id,
                    self.hasher.name()
                );
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Revokes the session behind a raw `token` cookie value, if any, and
    /// returns the `Set-Cookie` value that clears the cookie.
    pub fn logout(&self, request_token: Option<&str>) -> String {
        let revoked = request_token
            .and_then(decode_token)
            .is_some_and(|token| self.sessions.revoke(&token));
        info!("event=user_logout module=service status=ok revoked={revoked}");
        expired_session_cookie()
    }
}
