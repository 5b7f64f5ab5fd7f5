//! Derived, never-persisted note views.
//!
//! # Responsibility
//! - Classify notes into lifecycle categories.
//! - Assemble render-ready projections for the page layer.
//!
//! # Invariants
//! - Everything here is pure; results are recomputed on every read.

pub mod lifecycle;
pub mod projection;
