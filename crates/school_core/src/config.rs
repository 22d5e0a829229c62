//! Environment-sourced configuration.
//!
//! # Responsibility
//! - Read database and logging settings from process environment.
//! - Reject malformed values up front; this is the only fatal startup check.
//!
//! # Invariants
//! - Every setting is optional and has a default.
//! - The database password is never printed (`Debug` redacts it).

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_HOST: &str = "DB_HOST";
pub const ENV_DB_USER: &str = "DB_USER";
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_DB_NAME: &str = "DB_NAME";
pub const ENV_DB_PORT: &str = "DB_PORT";
pub const ENV_DB_SSL: &str = "DB_SSL";
pub const ENV_DB_DATA_DIR: &str = "DB_DATA_DIR";
pub const ENV_DB_CONNECT_TIMEOUT_MS: &str = "DB_CONNECT_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "SCHOOL_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "SCHOOL_LOG_DIR";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_USER: &str = "root";
const DEFAULT_DATABASE: &str = "school_management";
const DEFAULT_PORT: u16 = 3306;
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
const DATABASE_FILE_EXTENSION: &str = "sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key} `{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Relational store settings.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub port: u16,
    /// Encrypted-transport toggle, recorded for diagnostics.
    pub ssl: bool,
    /// Directory holding database files.
    pub data_dir: PathBuf,
    /// Upper bound on connection handshake, applied as busy timeout.
    pub connect_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            user: DEFAULT_USER.to_string(),
            password: String::new(),
            database: DEFAULT_DATABASE.to_string(),
            port: DEFAULT_PORT,
            ssl: false,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }
}

impl Debug for DbConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("port", &self.port)
            .field("ssl", &self.ssl)
            .field("data_dir", &self.data_dir)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl DbConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings from an explicit key/value map.
    pub fn from_map(values: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| values.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let database = match lookup(ENV_DB_NAME) {
            Some(name) => parse_database_name(name)?,
            None => defaults.database,
        };
        let port = match get(ENV_DB_PORT) {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: ENV_DB_PORT,
                value: raw,
                reason: "expected a port number",
            })?,
            None => defaults.port,
        };
        let ssl = match get(ENV_DB_SSL) {
            Some(raw) => parse_bool(ENV_DB_SSL, raw)?,
            None => defaults.ssl,
        };
        let connect_timeout = match get(ENV_DB_CONNECT_TIMEOUT_MS) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_DB_CONNECT_TIMEOUT_MS,
                        value: raw,
                        reason: "expected a positive number of milliseconds",
                    })
                }
            },
            None => defaults.connect_timeout,
        };

        Ok(Self {
            host: get(ENV_DB_HOST).unwrap_or(defaults.host),
            user: get(ENV_DB_USER).unwrap_or(defaults.user),
            // Passwords may legitimately contain surrounding spaces.
            password: lookup(ENV_DB_PASSWORD).unwrap_or(defaults.password),
            database,
            port,
            ssl,
            data_dir: get(ENV_DB_DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            connect_timeout,
        })
    }

    /// Returns the database file location: `<data_dir>/<database>.sqlite3`.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}.{DATABASE_FILE_EXTENSION}", self.database))
    }

    /// One-line, password-free description for logs and status output.
    pub fn describe(&self) -> String {
        format!(
            "host={} port={} user={} database={} tls={} path={}",
            self.host,
            self.port,
            self.user,
            self.database,
            self.ssl,
            self.database_path().display()
        )
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    /// `None` logs to stderr.
    pub log_dir: Option<String>,
}

impl LogConfig {
    pub fn from_env() -> Self {
        let get = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            level: get(ENV_LOG_LEVEL).unwrap_or_else(|| crate::default_log_level().to_string()),
            log_dir: get(ENV_LOG_DIR),
        }
    }
}

/// Seeds the process environment from `.env` when present.
///
/// Variables already set in the environment win over the file.
/// Returns the loaded file path, or `None` when there is no `.env`.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

fn parse_database_name(raw: String) -> Result<String, ConfigError> {
    let name = raw.trim().to_string();
    if name.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: ENV_DB_NAME,
            value: raw,
            reason: "database name must not be empty",
        });
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ConfigError::InvalidValue {
            key: ENV_DB_NAME,
            value: name,
            reason: "database name must not contain path separators",
        });
    }
    Ok(name)
}

fn parse_bool(key: &'static str, raw: String) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw,
            reason: "expected true|false",
        }),
    }
}
