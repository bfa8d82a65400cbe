//! Error type for the PostgreSQL adapter.
//!
//! `sqlx` errors are sorted into the three failure classes a scenario can
//! hit: the server could not be reached, the schema does not have what the
//! query references, or the query itself failed.

use bankql_core::{CredentialError, RowError};
use thiserror::Error;

/// Errors raised while connecting to or querying the database.
#[derive(Debug, Error)]
pub enum DbError {
    /// Unreachable host, rejected credentials, or a broken connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A referenced table, view, column or routine does not exist.
    #[error("Schema mismatch: {0}")]
    Schema(String),

    /// Any other error reported by the database.
    #[error("Query error: {0}")]
    Query(String),

    /// A column value could not be converted.
    #[error("Decode error in column {column}: {reason}")]
    Decode { column: String, reason: String },

    /// Malformed connection settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Row(#[from] RowError),
}

/// Failure class derived from a PostgreSQL SQLSTATE code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Connection,
    Schema,
    Query,
}

/// Classify a SQLSTATE code.
///
/// Class 08 (connection exception), class 28 (invalid authorization) and
/// 3D000 (unknown database) are connectivity failures. 42P01, 42883 and
/// 42703 (undefined table, function, column) are schema mismatches.
pub fn classify_sqlstate(code: Option<&str>) -> ErrorClass {
    match code {
        Some(c) if c.starts_with("08") || c.starts_with("28") || c == "3D000" => {
            ErrorClass::Connection
        }
        Some("42P01" | "42883" | "42703") => ErrorClass::Schema,
        _ => ErrorClass::Query,
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Connection(err.to_string()),
            sqlx::Error::Configuration(e) => Self::Configuration(e.to_string()),
            sqlx::Error::Database(db) => {
                let code = db.code().map(|c| c.into_owned());
                let message = match &code {
                    Some(c) => format!("{} (SQLSTATE {c})", db.message()),
                    None => db.message().to_string(),
                };
                match classify_sqlstate(code.as_deref()) {
                    ErrorClass::Connection => Self::Connection(message),
                    ErrorClass::Schema => Self::Schema(message),
                    ErrorClass::Query => Self::Query(message),
                }
            }
            sqlx::Error::ColumnDecode { index, source } => Self::Decode {
                column: index,
                reason: source.to_string(),
            },
            other => Self::Query(other.to_string()),
        }
    }
}
