//! Core domain logic for webnotes.
//! This crate is the single source of truth for auth and note invariants.

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod view;

pub use auth::gate::{AuthGate, AuthResult, DenyReason, GateOutcome};
pub use auth::hasher::{Argon2Hasher, CredentialHasher, HashError, Sha256Hasher};
pub use auth::session::{SessionCache, SessionError};
pub use config::{AppConfig, ConfigError, HasherKind};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Note, NoteForm, NoteId, NoteValidationError};
pub use model::user::{User, UserId};
pub use repo::note_repo::{NoteStore, Page, SqliteNoteStore};
pub use repo::user_repo::{SqliteUserStore, UserStore};
pub use repo::{RepoError, RepoResult};
pub use service::auth_service::{AuthError, AuthService, LoginSession, RegisterForm};
pub use service::note_service::{NoteService, NoteServiceError, NotesPage};
pub use view::lifecycle::{classify, Classification, NoteCategory, StatusTransition};
pub use view::projection::{project_notes, NoteEditView, NoteView};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
