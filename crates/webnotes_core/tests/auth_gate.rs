use std::cell::Cell;
use std::sync::Arc;
use webnotes_core::auth::gate::LOGIN_PATH;
use webnotes_core::{
    AuthGate, AuthResult, DenyReason, GateOutcome, SessionCache, Sha256Hasher, User,
};

fn gate_with_session(user: &User) -> (AuthGate, String) {
    let sessions = Arc::new(SessionCache::new(Arc::new(Sha256Hasher)));
    let token = sessions.issue(user).expect("session should be issued");
    (AuthGate::new(sessions), token)
}

#[test]
fn missing_cookie_redirects_without_invoking_handler() {
    let (gate, _) = gate_with_session(&User::new(1, "a", "h"));
    let invoked = Cell::new(false);

    let outcome = gate.guard(None, |_| invoked.set(true));

    assert_eq!(outcome, GateOutcome::RedirectToLogin(DenyReason::MissingCookie));
    assert_eq!(outcome.redirect_location(), Some(LOGIN_PATH));
    assert!(!invoked.get());
}

#[test]
fn cookie_header_without_token_is_missing_cookie() {
    let (gate, _) = gate_with_session(&User::new(1, "a", "h"));

    let result = gate.authorize_header(Some("theme=dark; lang=en"));

    assert_eq!(result, AuthResult::Unauthorized(DenyReason::MissingCookie));
}

#[test]
fn cache_hit_passes_user_id_to_handler() {
    let (gate, token) = gate_with_session(&User::new(42, "a", "h"));
    let header = format!("theme=dark; token={token}");

    let outcome = gate.guard(Some(&header), |user_id| user_id * 2);

    assert_eq!(outcome, GateOutcome::Handled(84));
    assert_eq!(outcome.redirect_location(), None);
}

#[test]
fn unknown_token_is_unauthorized() {
    let (gate, _) = gate_with_session(&User::new(1, "a", "h"));

    let result = gate.authorize(Some("deadbeef"));

    assert!(!result.ok());
    assert_eq!(result.user_id(), None);
    assert_eq!(result, AuthResult::Unauthorized(DenyReason::UnknownToken));
}

#[test]
fn undecodable_token_is_unauthorized() {
    let (gate, _) = gate_with_session(&User::new(1, "a", "h"));

    assert_eq!(
        gate.authorize(Some("abc%zz")),
        AuthResult::Unauthorized(DenyReason::Undecodable)
    );
}

#[test]
fn revoked_token_no_longer_authorizes() {
    let sessions = Arc::new(SessionCache::new(Arc::new(Sha256Hasher)));
    let gate = AuthGate::new(Arc::clone(&sessions));
    let token = sessions.issue(&User::new(3, "a", "h")).expect("session should be issued");
    assert_eq!(gate.authorize(Some(&token)).user_id(), Some(3));

    sessions.revoke(&token);

    assert!(!gate.authorize(Some(&token)).ok());
}
