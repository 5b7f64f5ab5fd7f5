//! Request authorization gate and session cookie helpers.
//!
//! # Responsibility
//! - Read the bearer token from the `token` cookie and resolve it through
//!   the session cache.
//! - Wrap page handlers so they only run with an authenticated user ID.
//! - Build the `Set-Cookie` values that carry tokens to the browser.
//!
//! # Invariants
//! - A missing cookie, an undecodable value and an unknown token all deny;
//!   a denied request never reaches the wrapped handler.
//! - The gate checks "has a live session" only. It does not check which
//!   user owns the note a handler is about to touch.

use crate::auth::session::SessionCache;
use crate::model::user::UserId;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use std::sync::Arc;

/// Cookie carrying the session token.
pub const TOKEN_COOKIE: &str = "token";
/// Where denied requests are sent.
pub const LOGIN_PATH: &str = "/login";
/// Client-side expiry hint written into the session cookie.
pub const DEFAULT_COOKIE_TTL_MINUTES: i64 = 60;

const COOKIE_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MissingCookie,
    Undecodable,
    UnknownToken,
}

impl DenyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingCookie => "missing_cookie",
            Self::Undecodable => "undecodable",
            Self::UnknownToken => "unknown_token",
        }
    }
}

/// Authorization decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthResult {
    Authorized { user_id: UserId },
    Unauthorized(DenyReason),
}

impl AuthResult {
    pub fn ok(&self) -> bool {
        matches!(self, Self::Authorized { .. })
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Authorized { user_id } => Some(*user_id),
            Self::Unauthorized(_) => None,
        }
    }
}

/// Result of running a handler behind the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome<T> {
    /// The handler ran and produced this value.
    Handled(T),
    /// The handler was skipped; redirect to [`LOGIN_PATH`].
    RedirectToLogin(DenyReason),
}

impl<T> GateOutcome<T> {
    pub fn redirect_location(&self) -> Option<&'static str> {
        match self {
            Self::Handled(_) => None,
            Self::RedirectToLogin(_) => Some(LOGIN_PATH),
        }
    }
}

/// Middleware-shaped authorization over a shared [`SessionCache`].
#[derive(Clone)]
pub struct AuthGate {
    sessions: Arc<SessionCache>,
}

impl AuthGate {
    pub fn new(sessions: Arc<SessionCache>) -> Self {
        Self { sessions }
    }

    /// Authorizes a raw (still percent-encoded) `token` cookie value.
    pub fn authorize(&self, request_token: Option<&str>) -> AuthResult {
        let result = match request_token {
            None => AuthResult::Unauthorized(DenyReason::MissingCookie),
            Some(raw) => match decode_token(raw) {
                None => AuthResult::Unauthorized(DenyReason::Undecodable),
                Some(token) => match self.sessions.lookup(&token) {
                    Some(user) => AuthResult::Authorized { user_id: user.id },
                    None => AuthResult::Unauthorized(DenyReason::UnknownToken),
                },
            },
        };

        if let AuthResult::Unauthorized(reason) = result {
            debug!(
                "event=auth_gate module=auth status=denied reason={}",
                reason.as_str()
            );
        }
        result
    }

    /// Authorizes a request from its raw `Cookie` header.
    pub fn authorize_header(&self, cookie_header: Option<&str>) -> AuthResult {
        self.authorize(cookie_header.and_then(token_from_cookie_header))
    }

    /// Runs `handler` with the authenticated user ID, or skips it.
    pub fn guard<T>(
        &self,
        cookie_header: Option<&str>,
        handler: impl FnOnce(UserId) -> T,
    ) -> GateOutcome<T> {
        match self.authorize_header(cookie_header) {
            AuthResult::Authorized { user_id } => GateOutcome::Handled(handler(user_id)),
            AuthResult::Unauthorized(reason) => GateOutcome::RedirectToLogin(reason),
        }
    }
}

/// Extracts the raw `token` value from a `Cookie` header.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name.trim() == TOKEN_COOKIE).then(|| value.trim())
    })
}

/// Percent-decodes a cookie value. Malformed escapes or non-UTF-8 bytes
/// yield `None`.
pub fn decode_token(raw: &str) -> Option<String> {
    if !has_valid_escapes(raw) {
        return None;
    }
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|value| value.into_owned())
}

/// Builds the `Set-Cookie` value for a freshly issued token.
///
/// Returns `None` when `issued_at + ttl` is not a representable instant.
pub fn session_cookie(token: &str, issued_at: DateTime<Utc>, ttl: Duration) -> Option<String> {
    let expires = issued_at.checked_add_signed(ttl)?;
    Some(format!(
        "{TOKEN_COOKIE}={}; Path=/; Expires={}; HttpOnly",
        utf8_percent_encode(token, NON_ALPHANUMERIC),
        expires.format(COOKIE_DATE_FORMAT)
    ))
}

/// Builds the `Set-Cookie` value that removes the token cookie.
pub fn expired_session_cookie() -> String {
    format!("{TOKEN_COOKIE}=; Path=/; Max-Age=0; HttpOnly")
}

fn has_valid_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%' {
            let valid = bytes
                .get(idx + 1..idx + 3)
                .is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return false;
            }
            idx += 3;
        } else {
            idx += 1;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn token_is_found_among_other_cookies() {
        assert_eq!(
            token_from_cookie_header("theme=dark; token=abc%24; lang=en"),
            Some("abc%24")
        );
        assert_eq!(token_from_cookie_header("tokens=1; xtoken=2"), None);
        assert_eq!(token_from_cookie_header(""), None);
    }

    #[test]
    fn decode_rejects_malformed_escapes() {
        assert_eq!(decode_token("a%2Fb").as_deref(), Some("a/b"));
        assert_eq!(decode_token("plain").as_deref(), Some("plain"));
        assert_eq!(decode_token("bad%2"), None);
        assert_eq!(decode_token("bad%zz"), None);
        assert_eq!(decode_token("%ff"), None);
    }

    #[test]
    fn session_cookie_encodes_token_and_expires_after_ttl() {
        let issued_at = Utc.with_ymd_and_hms(2024, 3, 9, 10, 30, 0).unwrap();
        let cookie = session_cookie(
            "$argon2id$v=19",
            issued_at,
            Duration::minutes(DEFAULT_COOKIE_TTL_MINUTES),
        )
        .expect("one hour after 2024 should be representable");
        assert!(cookie.starts_with("token=%24argon2id%24v%3D19;"));
        assert!(cookie.contains("Expires=Sat, 09 Mar 2024 11:30:00 GMT"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn encoded_cookie_round_trips_through_decode() {
        let issued_at = Utc.with_ymd_and_hms(2024, 3, 9, 10, 30, 0).unwrap();
        let cookie = session_cookie("a b/c", issued_at, Duration::minutes(1))
            .expect("cookie should build");
        let raw = token_from_cookie_header(&cookie).expect("cookie should carry the token");
        assert_eq!(decode_token(raw).as_deref(), Some("a b/c"));
    }

    #[test]
    fn unrepresentable_expiry_yields_no_cookie() {
        let issued_at = Utc.with_ymd_and_hms(2024, 3, 9, 10, 30, 0).unwrap();
        assert_eq!(
            session_cookie("t", issued_at, Duration::minutes(100_000_000_000_000)),
            None
        );
        assert_eq!(session_cookie("t", DateTime::<Utc>::MAX_UTC, Duration::minutes(1)), None);
    }

    #[test]
    fn expired_cookie_clears_value() {
        let cookie = expired_session_cookie();
        assert!(cookie.starts_with("token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
