//! Domain records owned by storage.
//!
//! # Invariants
//! - Users and notes are identified by storage-assigned numeric IDs.
//! - Optional note fields stay `Option` until the render boundary.

pub mod note;
pub mod user;
