#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]

pub mod decode;
pub mod error;
pub mod factory;
pub mod runner;

pub use error::{DbError, ErrorClass, classify_sqlstate};
pub use factory::{DriverConnection, Engine, Session, connect_driver, parse_keyword_dsn};
pub use runner::run_query;
