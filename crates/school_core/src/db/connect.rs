//! Connection bootstrap for the relational store.
//!
//! # Responsibility
//! - Open SQLite connections described by `DbConfig`.
//! - Memoize one handle per provider until it is released.
//!
//! # Invariants
//! - Returned connections answered a catalog query within the connect timeout.
//! - Providers never retry; fallback policy belongs to the storage facade.

use crate::config::DbConfig;
use log::{error, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Instant;

/// Handshake failure while opening the relational store.
#[derive(Debug)]
pub enum ConnectionError {
    /// Data directory is missing or is not a directory.
    DataDirUnavailable { path: PathBuf, reason: String },
    /// Engine refused to open or read the database.
    Sqlite(rusqlite::Error),
}

impl Display for ConnectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataDirUnavailable { path, reason } => {
                write!(f, "data directory `{}` unavailable: {reason}", path.display())
            }
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConnectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DataDirUnavailable { .. } => None,
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for ConnectionError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Produces fresh relational connections.
pub trait Connector {
    fn connect(&self) -> Result<Connection, ConnectionError>;
    /// Password-free target description for logs.
    fn describe(&self) -> String;
}

/// Opens `<data_dir>/<database>.sqlite3`, creating the file when absent.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    config: DbConfig,
}

impl SqliteConnector {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }
}

impl Connector for SqliteConnector {
    /// # Side effects
    /// - Creates the database file when the data directory exists but the
    ///   file does not.
    /// - Emits `db_connect` logging events with duration and status.
    fn connect(&self) -> Result<Connection, ConnectionError> {
        let started_at = Instant::now();
        info!(
            "event=db_connect module=db status=start {}",
            self.config.describe()
        );

        match open_and_check(&self.config) {
            Ok(conn) => {
                info!(
                    "event=db_connect module=db status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(conn)
            }
            Err(err) => {
                error!(
                    "event=db_connect module=db status=error duration_ms={} error_code=db_connect_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn describe(&self) -> String {
        self.config.describe()
    }
}

fn open_and_check(config: &DbConfig) -> Result<Connection, ConnectionError> {
    match std::fs::metadata(&config.data_dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(ConnectionError::DataDirUnavailable {
                path: config.data_dir.clone(),
                reason: "not a directory".to_string(),
            })
        }
        Err(err) => {
            return Err(ConnectionError::DataDirUnavailable {
                path: config.data_dir.clone(),
                reason: err.to_string(),
            })
        }
    }

    let conn = Connection::open(config.database_path())?;
    conn.busy_timeout(config.connect_timeout)?;
    // Reading the catalog fails fast on non-database files and waits at most
    // `connect_timeout` on a locked one.
    conn.query_row("SELECT count(*) FROM sqlite_master;", [], |row| {
        row.get::<_, i64>(0)
    })?;
    Ok(conn)
}

/// Lazily opens and memoizes one connection.
pub struct ConnectionProvider<C> {
    connector: C,
    handle: Option<Connection>,
}

impl<C: Connector> ConnectionProvider<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            handle: None,
        }
    }

    /// Returns the memoized handle, opening it on first use.
    ///
    /// # Errors
    /// - Returns `ConnectionError` when the handshake fails. Nothing is
    ///   memoized in that case.
    pub fn acquire(&mut self) -> Result<&mut Connection, ConnectionError> {
        let conn = match self.handle.take() {
            Some(conn) => conn,
            None => self.connector.connect()?,
        };
        Ok(self.handle.insert(conn))
    }

    /// Drops the memoized handle; the next `acquire` reconnects.
    pub fn release(&mut self) {
        self.handle = None;
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }
}

#[cfg(test)]
mod tests {
    use super::{ConnectionError, ConnectionProvider, Connector, SqliteConnector};
    use crate::config::DbConfig;
    use rusqlite::Connection;
    use std::cell::Cell;

    struct CountingConnector {
        opened: Cell<u32>,
    }

    impl Connector for CountingConnector {
        fn connect(&self) -> Result<Connection, ConnectionError> {
            self.opened.set(self.opened.get() + 1);
            Ok(Connection::open_in_memory()?)
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    #[test]
    fn acquire_memoizes_until_release() {
        let mut provider = ConnectionProvider::new(CountingConnector {
            opened: Cell::new(0),
        });
        assert!(!provider.is_connected());

        provider.acquire().expect("first acquire");
        provider.acquire().expect("second acquire");
        assert_eq!(provider.connector().opened.get(), 1);
        assert!(provider.is_connected());

        provider.release();
        provider.acquire().expect("acquire after release");
        assert_eq!(provider.connector().opened.get(), 2);
    }

    #[test]
    fn missing_data_dir_is_a_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig {
            data_dir: dir.path().join("absent"),
            ..DbConfig::default()
        };
        let mut provider = ConnectionProvider::new(SqliteConnector::new(config));

        let err = provider.acquire().unwrap_err();
        assert!(matches!(err, ConnectionError::DataDirUnavailable { .. }));
        assert!(!provider.is_connected());
    }

    #[test]
    fn non_database_file_is_a_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig {
            data_dir: dir.path().to_path_buf(),
            ..DbConfig::default()
        };
        std::fs::write(config.database_path(), vec![b'x'; 4096]).unwrap();

        let err = SqliteConnector::new(config).connect().unwrap_err();
        assert!(matches!(err, ConnectionError::Sqlite(_)));
    }
}
