//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls, hashing and session handling into the
//!   operations page handlers invoke.
//! - Map every failure to a user-visible message scoped to one request.

pub mod auth_service;
pub mod note_service;
