//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into collaborator-facing APIs.
//! - Keep request handlers and the CLI decoupled from backend selection.

pub mod school_store;
