//! Repository layer: one CRUD contract, two backends.
//!
//! # Responsibility
//! - Define the `SchoolRepository` contract shared by both backends.
//! - Isolate SQLite query details from the storage facade.
//!
//! # Invariants
//! - Write paths call `NewSchool::validate()` before mutating any store.
//! - Absent records are `Ok(None)` / `Ok(false)`, never an error.
//! - Listings are ordered `created_at DESC, id DESC`.

use crate::db::is_connectivity_error;
use crate::model::school::{NewSchool, School, SchoolId, SchoolValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory_repo;
pub mod school_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for school persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(SchoolValidationError),
    Db(rusqlite::Error),
    InvalidData(String),
}

impl RepoError {
    /// Whether the failure means the store is unreachable.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Db(err) => is_connectivity_error(err),
            Self::Validation(_) | Self::InvalidData(_) => false,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted school data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<SchoolValidationError> for RepoError {
    fn from(value: SchoolValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(value)
    }
}

/// CRUD contract implemented by the relational and in-memory backends.
pub trait SchoolRepository {
    /// Validates and stores `school`, returning the backend-assigned id.
    fn create_school(&self, school: &NewSchool) -> RepoResult<SchoolId>;
    /// All schools, newest first.
    fn list_schools(&self) -> RepoResult<Vec<School>>;
    fn get_school(&self, id: SchoolId) -> RepoResult<Option<School>>;
    /// Returns whether a record was removed.
    fn delete_school(&self, id: SchoolId) -> RepoResult<bool>;
}
