//! Domain model for school records.
//!
//! # Responsibility
//! - Define the single-table record shape shared by every backend.
//!
//! # Invariants
//! - Records are created and deleted, never updated in place.

pub mod school;
