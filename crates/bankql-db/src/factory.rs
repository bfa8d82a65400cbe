//! Connection construction for PostgreSQL.
//!
//! Two flavors are offered, both built from resolved [`Credentials`]:
//!
//! - [`connect_driver`] opens a single low-level connection from the
//!   keyword connection string.
//! - [`Engine`] holds options parsed from the URL form. Each [`Session`]
//!   it opens owns a dedicated connection that is closed on drop, on every
//!   exit path including a failed assertion.

use std::iter::Peekable;
use std::str::{Chars, FromStr};

use bankql_core::{Credentials, QueryResult};
use sqlx::Connection;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use tracing::{debug, info};

use crate::error::DbError;
use crate::runner::run_query;

/// Parse a keyword connection string into driver options.
///
/// Accepts whitespace-separated `key=value` pairs. Values are either bare
/// words or single-quoted with backslash escapes. Unrecognized keys are
/// skipped.
pub fn parse_keyword_dsn(dsn: &str) -> Result<PgConnectOptions, DbError> {
    let mut options = PgConnectOptions::new_without_pgpass();

    for (key, value) in tokenize_keyword_dsn(dsn)? {
        options = match key.as_str() {
            "dbname" => options.database(&value),
            "user" => options.username(&value),
            "host" => options.host(&value),
            "password" => options.password(&value),
            "port" => {
                let port = value.parse::<u16>().map_err(|e| {
                    DbError::Configuration(format!("invalid port {value:?}: {e}"))
                })?;
                options.port(port)
            }
            other => {
                debug!(key = other, "ignoring unrecognized connection keyword");
                options
            }
        };
    }

    Ok(options)
}

fn tokenize_keyword_dsn(dsn: &str) -> Result<Vec<(String, String)>, DbError> {
    let mut pairs = Vec::new();
    let mut chars = dsn.chars().peekable();

    loop {
        skip_whitespace(&mut chars);
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
            key.push(c);
        }
        skip_whitespace(&mut chars);
        if chars.next() != Some('=') {
            return Err(DbError::Configuration(format!(
                "missing '=' after connection keyword {key:?}"
            )));
        }
        skip_whitespace(&mut chars);

        let value = if chars.next_if_eq(&'\'').is_some() {
            read_quoted(&mut chars).ok_or_else(|| {
                DbError::Configuration(format!("unterminated quoted value for {key:?}"))
            })?
        } else {
            let mut value = String::new();
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                value.push(c);
            }
            value
        };
        pairs.push((key, value));
    }

    Ok(pairs)
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

/// Read up to the closing quote. `None` if the input ends first.
fn read_quoted(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut value = String::new();
    loop {
        match chars.next()? {
            '\\' => value.push(chars.next()?),
            '\'' => return Some(value),
            c => value.push(c),
        }
    }
}

/// A single connection opened from the keyword connection string.
pub struct DriverConnection {
    conn: PgConnection,
}

/// Open a driver-level connection.
///
/// Unreachable hosts and rejected credentials return
/// [`DbError::Connection`]. There is no retry.
pub async fn connect_driver(creds: &Credentials) -> Result<DriverConnection, DbError> {
    let options = parse_keyword_dsn(&creds.keyword_dsn())?;
    let conn = PgConnection::connect_with(&options).await?;
    info!(target_db = %creds.redacted(), "driver connection established");
    Ok(DriverConnection { conn })
}

impl DriverConnection {
    pub async fn query(&mut self, sql: &str) -> Result<QueryResult, DbError> {
        run_query(&mut self.conn, sql).await
    }

    pub async fn ping(&mut self) -> Result<(), DbError> {
        self.conn.ping().await?;
        Ok(())
    }

    /// Close the connection gracefully.
    pub async fn close(self) -> Result<(), DbError> {
        self.conn.close().await?;
        Ok(())
    }
}

/// Higher-level handle that hands out sessions.
///
/// Creating an engine only parses the URL and never touches the network.
/// Each [`Engine::session`] call opens its own connection, so a refused
/// or rejected connection is reported by that call, with no retry.
#[derive(Clone)]
pub struct Engine {
    options: PgConnectOptions,
    target: String,
}

impl Engine {
    pub fn new(creds: &Credentials) -> Result<Self, DbError> {
        let options = PgConnectOptions::from_str(&creds.url())?;
        let target = creds.redacted();
        info!(target_db = %target, "engine created");
        Ok(Self { options, target })
    }

    /// Open a live session.
    pub async fn session(&self) -> Result<Session, DbError> {
        let conn = PgConnection::connect_with(&self.options).await?;
        debug!(target_db = %self.target, "session opened");
        Ok(Session { conn })
    }

    /// `user@host:port/dbname` of the engine's target.
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// A connection owned by one test.
///
/// Dropping the session closes its socket, on every exit path.
/// [`Session::close`] additionally says goodbye to the server.
pub struct Session {
    conn: PgConnection,
}

impl Session {
    pub async fn query(&mut self, sql: &str) -> Result<QueryResult, DbError> {
        run_query(&mut self.conn, sql).await
    }

    pub async fn close(self) -> Result<(), DbError> {
        self.conn.close().await?;
        Ok(())
    }
}
