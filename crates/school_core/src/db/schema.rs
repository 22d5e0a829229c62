//! Schema initializer for the `schools` table.
//!
//! # Responsibility
//! - Create the table and its listing index when absent.
//!
//! # Invariants
//! - Idempotent: running on an initialized database is a no-op.
//! - DDL runs in one transaction; a failure leaves no partial schema.

use super::is_connectivity_error;
use log::{error, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// DDL failure while ensuring the schema.
#[derive(Debug)]
pub enum SchemaError {
    Sqlite(rusqlite::Error),
}

impl SchemaError {
    /// Whether the failure came from losing the store rather than bad DDL.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Sqlite(err) => is_connectivity_error(err),
        }
    }
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "schema initialization failed: {err}"),
        }
    }
}

impl Error for SchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for SchemaError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Ensures the `schools` table exists on `conn`.
///
/// # Side effects
/// - Emits `db_schema` logging events with duration and status.
pub fn ensure_schema(conn: &mut Connection) -> Result<(), SchemaError> {
    let started_at = Instant::now();

    match apply_schema(conn) {
        Ok(()) => {
            info!(
                "event=db_schema module=db status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err(err) => {
            error!(
                "event=db_schema module=db status=error duration_ms={} error_code=db_schema_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn apply_schema(conn: &mut Connection) -> Result<(), SchemaError> {
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.commit()?;
    Ok(())
}
