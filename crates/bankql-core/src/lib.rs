#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod assert;
pub mod credentials;
pub mod error;
pub mod row;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export commonly used types for convenience
pub use assert::{
    approx_eq, assert_columns_contain, assert_decimal_eq, assert_row_count, assert_same_set, dec,
};
pub use credentials::{
    Credentials, DEFAULT_DBNAME, DEFAULT_HOST, DEFAULT_PASSWORD, DEFAULT_PORT, DEFAULT_USER,
    ENV_DBHOST, ENV_DBNAME, ENV_DBPASSWORD, ENV_DBPORT, ENV_DBUSER, is_loopback,
};
pub use error::{CredentialError, RowError};
pub use row::{QueryResult, RowMap, Value};

// Re-exported so adapters and tests share one decimal type
pub use rust_decimal::Decimal;
