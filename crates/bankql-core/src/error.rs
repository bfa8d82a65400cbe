//! Error types for credential resolution and row access.
//!
//! These errors carry no driver types so they can be shared by any
//! adapter that executes the schema queries.

use thiserror::Error;

/// Errors raised while resolving connection credentials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// `DBPORT` was set but is not a valid TCP port.
    #[error("Invalid port {value:?}: {reason}")]
    InvalidPort { value: String, reason: String },

    /// A non-loopback host was configured without `DBPASSWORD`.
    #[error("DBPASSWORD must be set explicitly for non-local host {host}")]
    MissingPassword { host: String },
}

/// Errors raised while shaping or reading query results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// The number of values does not match the number of columns.
    #[error("Row has {values} values but the result has {columns} columns")]
    ArityMismatch { columns: usize, values: usize },

    /// A row index past the end of the result was requested.
    #[error("Row {index} requested but the result has {len} rows")]
    OutOfBounds { index: usize, len: usize },

    /// The named column is not part of the result.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// The value in a column does not have the requested type.
    #[error("Column {column} holds {actual}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },
}
