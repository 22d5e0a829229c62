//! Volatile in-memory school store.
//!
//! # Responsibility
//! - Stand in for the `schools` table when the relational store is gone.
//!
//! # Invariants
//! - Ids start at 1, increase by one per create and are never reused.
//! - Id assignment and append happen under one lock.
//! - Contents are lost with the process.

use super::{RepoResult, SchoolRepository};
use crate::model::school::{sort_newest_first, NewSchool, School, SchoolId, SchoolValidationError};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug)]
struct MemoryState {
    next_id: SchoolId,
    schools: Vec<School>,
}

/// Thread-safe in-memory store with auto-incrementing ids.
#[derive(Debug)]
pub struct MemorySchoolStore {
    state: Mutex<MemoryState>,
}

impl Default for MemorySchoolStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySchoolStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                next_id: 1,
                schools: Vec::new(),
            }),
        }
    }

    /// Validates, stamps and appends `school`, returning its new id.
    pub fn create(&self, school: &NewSchool) -> Result<SchoolId, SchoolValidationError> {
        school.validate()?;

        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state
            .schools
            .push(school.clone().into_school(id, now_epoch_ms()));
        Ok(id)
    }

    /// All records, newest first.
    pub fn list_all(&self) -> Vec<School> {
        let mut schools = self.lock().schools.clone();
        sort_newest_first(&mut schools);
        schools
    }

    pub fn get_by_id(&self, id: SchoolId) -> Option<School> {
        self.lock()
            .schools
            .iter()
            .find(|school| school.id == id)
            .cloned()
    }

    /// Removes the first record with `id`; returns whether one was removed.
    pub fn delete_by_id(&self, id: SchoolId) -> bool {
        let mut state = self.lock();
        match state.schools.iter().position(|school| school.id == id) {
            Some(index) => {
                state.schools.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().schools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // Id bump and push are infallible, so a poisoned state is still whole.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SchoolRepository for MemorySchoolStore {
    fn create_school(&self, school: &NewSchool) -> RepoResult<SchoolId> {
        Ok(self.create(school)?)
    }

    fn list_schools(&self) -> RepoResult<Vec<School>> {
        Ok(self.list_all())
    }

    fn get_school(&self, id: SchoolId) -> RepoResult<Option<School>> {
        Ok(self.get_by_id(id))
    }

    fn delete_school(&self, id: SchoolId) -> RepoResult<bool> {
        Ok(self.delete_by_id(id))
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
