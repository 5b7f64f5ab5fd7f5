//! Authentication primitives: credential hashing, the session cache and
//! the request gate.
//!
//! # Invariants
//! - Session state is process-local and injected as `Arc<SessionCache>`.
//! - Tokens, passwords and digests never appear in log events.

pub mod gate;
pub mod hasher;
pub mod session;
