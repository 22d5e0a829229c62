//! Core storage logic for the school registry.
//! This crate owns the record model and the relational/in-memory fallback.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{load_dotenv, ConfigError, DbConfig, LogConfig};
pub use db::{
    ensure_schema, ConnectionError, ConnectionProvider, Connector, SchemaError, SqliteConnector,
};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::school::{NewSchool, School, SchoolField, SchoolId, SchoolValidationError};
pub use repo::memory_repo::MemorySchoolStore;
pub use repo::school_repo::SqliteSchoolRepository;
pub use repo::{RepoError, RepoResult, SchoolRepository};
pub use service::school_store::{BackendMode, SchoolStore, StorageContext, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
