//! SQLite storage bootstrap: connection provider and schema initializer.
//!
//! # Responsibility
//! - Open and memoize connections to the relational store.
//! - Ensure the `schools` schema exists before data access.
//! - Classify engine failures as connectivity loss or data rejection.
//!
//! # Invariants
//! - Core code must not read/write application data before the schema
//!   initializer succeeded on the connection.

use rusqlite::ErrorCode;

mod connect;
mod schema;

pub use connect::{ConnectionError, ConnectionProvider, Connector, SqliteConnector};
pub use schema::{ensure_schema, SchemaError};

/// Returns whether `err` means the store became unreachable or unusable,
/// as opposed to rejecting a particular statement or value.
pub fn is_connectivity_error(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(
            ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::PermissionDenied
                | ErrorCode::ReadOnly
                | ErrorCode::DiskFull
                | ErrorCode::FileLockingProtocolFailed
                | ErrorCode::OperationInterrupted
                | ErrorCode::NoLargeFileSupport
        )
    )
}

#[cfg(test)]
mod tests {
    use super::is_connectivity_error;
    use rusqlite::{ffi, Connection};

    fn failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None)
    }

    #[test]
    fn lock_and_io_failures_are_connectivity() {
        assert!(is_connectivity_error(&failure(ffi::SQLITE_BUSY)));
        assert!(is_connectivity_error(&failure(ffi::SQLITE_IOERR)));
        assert!(is_connectivity_error(&failure(ffi::SQLITE_NOTADB)));
    }

    #[test]
    fn rejected_statements_are_not_connectivity() {
        assert!(!is_connectivity_error(&failure(ffi::SQLITE_CONSTRAINT)));
        assert!(!is_connectivity_error(&failure(ffi::SQLITE_MISMATCH)));

        let conn = Connection::open_in_memory().unwrap();
        let err = conn.execute("INSERT INTO missing_table VALUES (1);", []).unwrap_err();
        assert!(!is_connectivity_error(&err));
    }
}
