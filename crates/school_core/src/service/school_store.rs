//! Storage facade with relational-to-memory failover.
//!
//! # Responsibility
//! - Expose create/list/get/delete for school records.
//! - Decide once which backend is authoritative and keep that decision.
//! - Absorb connectivity loss by switching to the in-memory store.
//!
//! # Invariants
//! - The backend mode is resolved lazily, on the first operation, and at
//!   most once per `StorageContext`.
//! - `Memory` is terminal: there is no promotion back to `Relational`.
//! - Connectivity failures never reach callers; rejected writes do, and do
//!   not trigger failover.
//! - Latch resolution is single-flight: one connection attempt and one
//!   schema initialization per context, even under concurrent callers.

use crate::config::DbConfig;
use crate::db::{ensure_schema, ConnectionProvider, Connector, SchemaError, SqliteConnector};
use crate::model::school::{NewSchool, School, SchoolId, SchoolValidationError};
use crate::repo::memory_repo::MemorySchoolStore;
use crate::repo::school_repo::SqliteSchoolRepository;
use crate::repo::{RepoError, RepoResult, SchoolRepository};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub type StoreResult<T> = Result<T, StoreError>;

/// Backend currently serving storage operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendMode {
    /// SQLite store of record.
    Relational,
    /// Volatile fallback after connectivity loss.
    Memory,
}

impl BackendMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relational => "relational",
            Self::Memory => "memory",
        }
    }
}

/// Failures surfaced by the storage facade.
#[derive(Debug)]
pub enum StoreError {
    /// Input rejected before reaching any backend.
    Validation(SchoolValidationError),
    /// Relational schema could not be initialized.
    Schema(SchemaError),
    /// Reachable relational store rejected a write.
    Write(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid school: {err}"),
            Self::Schema(err) => write!(f, "{err}"),
            Self::Write(err) => write!(f, "write rejected: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Schema(err) => Some(err),
            Self::Write(err) => Some(err),
        }
    }
}

impl From<SchoolValidationError> for StoreError {
    fn from(value: SchoolValidationError) -> Self {
        Self::Validation(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpKind {
    Read,
    Write,
}

struct LatchState<C> {
    mode: Option<BackendMode>,
    provider: ConnectionProvider<C>,
}

/// Owned storage state: mode latch, memoized connection and memory store.
pub struct StorageContext<C> {
    latch: Mutex<LatchState<C>>,
    memory: MemorySchoolStore,
}

impl<C: Connector> StorageContext<C> {
    pub fn new(connector: C) -> Self {
        Self {
            latch: Mutex::new(LatchState {
                mode: None,
                provider: ConnectionProvider::new(connector),
            }),
            memory: MemorySchoolStore::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LatchState<C>> {
        self.latch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Storage facade used by request handlers and the CLI.
pub struct SchoolStore<C = SqliteConnector> {
    ctx: StorageContext<C>,
}

impl SchoolStore<SqliteConnector> {
    /// Builds a store targeting the SQLite database described by `config`.
    pub fn from_config(config: DbConfig) -> Self {
        Self::new(SqliteConnector::new(config))
    }
}

impl<C: Connector> SchoolStore<C> {
    pub fn new(connector: C) -> Self {
        Self::with_context(StorageContext::new(connector))
    }

    pub fn with_context(ctx: StorageContext<C>) -> Self {
        Self { ctx }
    }

    /// Current latch value; `None` until the first operation resolves it.
    pub fn mode(&self) -> Option<BackendMode> {
        self.ctx.lock().mode
    }

    /// Password-free description of the relational target.
    pub fn target(&self) -> String {
        self.ctx.lock().provider.connector().describe()
    }

    /// Stores a new school and returns its id.
    ///
    /// # Errors
    /// - `StoreError::Validation` when a field rule is violated.
    /// - `StoreError::Write` when the relational store rejects the row.
    /// - `StoreError::Schema` when the first relational use cannot
    ///   initialize the schema.
    pub fn create_school(&self, school: &NewSchool) -> StoreResult<SchoolId> {
        school.validate()?;
        self.run(
            "create_school",
            OpKind::Write,
            |repo| repo.create_school(school),
            |memory| memory.create_school(school),
        )
    }

    /// Lists every school, newest first.
    pub fn list_schools(&self) -> StoreResult<Vec<School>> {
        self.run(
            "list_schools",
            OpKind::Read,
            |repo| repo.list_schools(),
            |memory| memory.list_schools(),
        )
    }

    /// Looks up one school; `Ok(None)` when absent.
    pub fn get_school(&self, id: SchoolId) -> StoreResult<Option<School>> {
        self.run(
            "get_school",
            OpKind::Read,
            |repo| repo.get_school(id),
            |memory| memory.get_school(id),
        )
    }

    /// Deletes one school; `Ok(false)` when absent.
    pub fn delete_school(&self, id: SchoolId) -> StoreResult<bool> {
        self.run(
            "delete_school",
            OpKind::Write,
            |repo| repo.delete_school(id),
            |memory| memory.delete_school(id),
        )
    }

    fn run<T>(
        &self,
        op: &'static str,
        kind: OpKind,
        relational: impl FnOnce(&SqliteSchoolRepository<'_>) -> RepoResult<T>,
        memory: impl FnOnce(&MemorySchoolStore) -> RepoResult<T>,
    ) -> StoreResult<T> {
        let mut state = self.ctx.lock();
        let mode = match state.mode {
            Some(mode) => mode,
            None => self.resolve_mode(&mut state)?,
        };

        if mode == BackendMode::Memory {
            drop(state);
            return self.run_memory(memory);
        }

        let outcome = match state.provider.acquire() {
            Ok(conn) => relational(&SqliteSchoolRepository::new(conn)),
            Err(err) => {
                self.demote(&mut state, op, &err);
                drop(state);
                return self.run_memory(memory);
            }
        };

        match outcome {
            Ok(value) => Ok(value),
            Err(err) if kind == OpKind::Read || err.is_connectivity() => {
                self.demote(&mut state, op, &err);
                drop(state);
                self.run_memory(memory)
            }
            Err(RepoError::Validation(err)) => Err(StoreError::Validation(err)),
            Err(err) => {
                error!(
                    "event=store_write module=store status=error op={} error_code=write_rejected error={}",
                    op, err
                );
                Err(StoreError::Write(err))
            }
        }
    }

    fn run_memory<T>(
        &self,
        memory: impl FnOnce(&MemorySchoolStore) -> RepoResult<T>,
    ) -> StoreResult<T> {
        memory(&self.ctx.memory).map_err(|err| match err {
            RepoError::Validation(err) => StoreError::Validation(err),
            other => StoreError::Write(other),
        })
    }

    fn resolve_mode(&self, state: &mut LatchState<C>) -> StoreResult<BackendMode> {
        let conn = match state.provider.acquire() {
            Ok(conn) => conn,
            Err(err) => {
                warn!(
                    "event=store_mode module=store status=fallback mode=memory reason=connect_failed error={}",
                    err
                );
                state.mode = Some(BackendMode::Memory);
                return Ok(BackendMode::Memory);
            }
        };

        match ensure_schema(conn) {
            Ok(()) => {
                info!("event=store_mode module=store status=ok mode=relational");
                state.mode = Some(BackendMode::Relational);
                Ok(BackendMode::Relational)
            }
            Err(err) if err.is_connectivity() => {
                warn!(
                    "event=store_mode module=store status=fallback mode=memory reason=schema_unreachable error={}",
                    err
                );
                state.provider.release();
                state.mode = Some(BackendMode::Memory);
                Ok(BackendMode::Memory)
            }
            Err(err) => {
                state.provider.release();
                Err(StoreError::Schema(err))
            }
        }
    }

    fn demote(&self, state: &mut LatchState<C>, op: &'static str, err: &dyn Display) {
        warn!(
            "event=store_mode module=store status=fallback mode=memory op={} reason=relational_failed error={}",
            op, err
        );
        state.provider.release();
        state.mode = Some(BackendMode::Memory);
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendMode, SchoolStore, StorageContext, StoreError};
    use crate::db::{ConnectionError, Connector};
    use crate::model::school::NewSchool;
    use rusqlite::Connection;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Hands out in-memory SQLite connections, or fails when `reachable` is off.
    struct ScriptedConnector {
        reachable: bool,
        attempts: Arc<AtomicU32>,
    }

    impl Connector for ScriptedConnector {
        fn connect(&self) -> Result<Connection, ConnectionError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if !self.reachable {
                return Err(ConnectionError::DataDirUnavailable {
                    path: "/unreachable".into(),
                    reason: "scripted outage".to_string(),
                });
            }
            Ok(Connection::open_in_memory()?)
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn store(reachable: bool) -> (SchoolStore<ScriptedConnector>, Arc<AtomicU32>) {
        let attempts = Arc::new(AtomicU32::new(0));
        let store = SchoolStore::new(ScriptedConnector {
            reachable,
            attempts: Arc::clone(&attempts),
        });
        (store, attempts)
    }

    fn oak() -> NewSchool {
        NewSchool::new(
            "Oak Elementary",
            "12 Pine Rd",
            "Springfield",
            "IL",
            5_551_234_567,
            "info@oak.edu",
        )
    }

    #[test]
    fn mode_is_unresolved_until_first_operation() {
        let (store, attempts) = store(true);
        assert_eq!(store.mode(), None);
        assert_eq!(attempts.load(Ordering::SeqCst), 0);

        store.list_schools().unwrap();
        assert_eq!(store.mode(), Some(BackendMode::Relational));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn relational_connection_is_reused_across_operations() {
        let (store, attempts) = store(true);
        let id = store.create_school(&oak()).unwrap();
        assert_eq!(store.get_school(id).unwrap().unwrap().name, "Oak Elementary");
        assert_eq!(store.list_schools().unwrap().len(), 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unreachable_store_is_attempted_once() {
        let (store, attempts) = store(false);
        store.create_school(&oak()).unwrap();
        store.list_schools().unwrap();
        store.get_school(1).unwrap();
        assert_eq!(store.mode(), Some(BackendMode::Memory));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn validation_runs_before_mode_resolution() {
        let (store, attempts) = store(true);
        let mut bad = oak();
        bad.name = String::new();

        let err = store.create_school(&bad).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.mode(), None);
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn injected_context_starts_unresolved_and_owns_the_latch() {
        let attempts = Arc::new(AtomicU32::new(0));
        let ctx = StorageContext::new(ScriptedConnector {
            reachable: false,
            attempts: Arc::clone(&attempts),
        });
        let store = SchoolStore::with_context(ctx);
        assert_eq!(store.mode(), None);

        assert_eq!(store.create_school(&oak()).unwrap(), 1);
        assert_eq!(store.mode(), Some(BackendMode::Memory));
        assert_eq!(store.target(), "scripted");
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delete_works_on_both_backends() {
        for reachable in [true, false] {
            let (store, _) = store(reachable);
            let id = store.create_school(&oak()).unwrap();
            assert!(store.delete_school(id).unwrap());
            assert!(!store.delete_school(id).unwrap());
            assert!(store.get_school(id).unwrap().is_none());
        }
    }
}
