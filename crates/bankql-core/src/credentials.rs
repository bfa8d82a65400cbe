//! Connection credential resolution.
//!
//! Credentials are read from five environment variables, each falling back
//! to a fixed default. Every call reads the environment again, so each test
//! gets an independently resolved record.

use std::fmt;

use crate::error::CredentialError;

/// Environment variable holding the database name.
pub const ENV_DBNAME: &str = "DBNAME";
/// Environment variable holding the server host.
pub const ENV_DBHOST: &str = "DBHOST";
/// Environment variable holding the server port.
pub const ENV_DBPORT: &str = "DBPORT";
/// Environment variable holding the login role.
pub const ENV_DBUSER: &str = "DBUSER";
/// Environment variable holding the login password.
pub const ENV_DBPASSWORD: &str = "DBPASSWORD";

pub const DEFAULT_DBNAME: &str = "postgres";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_USER: &str = "postgres";

/// Fallback password, only honoured for loopback hosts.
pub const DEFAULT_PASSWORD: &str = "postgres";

/// Parameters needed to open a database connection.
///
/// Immutable once resolved. The password never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub dbname: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            dbname: DEFAULT_DBNAME.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }
}

impl Credentials {
    /// Resolve credentials from the process environment.
    pub fn from_env() -> Result<Self, CredentialError> {
        Self::resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve credentials through an arbitrary variable lookup.
    ///
    /// Empty values count as unset. A password is required whenever the
    /// host is not a loopback address.
    pub fn resolve_with<F>(lookup: F) -> Result<Self, CredentialError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let dbname = get(ENV_DBNAME).unwrap_or_else(|| DEFAULT_DBNAME.to_string());
        let host = get(ENV_DBHOST).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let user = get(ENV_DBUSER).unwrap_or_else(|| DEFAULT_USER.to_string());

        let port = match get(ENV_DBPORT) {
            Some(raw) => parse_port(&raw)?,
            None => DEFAULT_PORT,
        };

        let password = match get(ENV_DBPASSWORD) {
            Some(password) => password,
            None if is_loopback(&host) => {
                tracing::warn!(%host, "DBPASSWORD not set, using the local default password");
                DEFAULT_PASSWORD.to_string()
            }
            None => return Err(CredentialError::MissingPassword { host }),
        };

        Ok(Self {
            dbname,
            host,
            port,
            user,
            password,
        })
    }

    /// Driver-level connection string of quoted `key='value'` pairs.
    ///
    /// Backslashes and single quotes inside values are escaped with a
    /// backslash, as libpq expects.
    pub fn keyword_dsn(&self) -> String {
        let port = self.port.to_string();
        [
            ("dbname", self.dbname.as_str()),
            ("user", self.user.as_str()),
            ("host", self.host.as_str()),
            ("port", port.as_str()),
            ("password", self.password.as_str()),
        ]
        .iter()
        .map(|(key, value)| format!("{key}='{}'", escape_dsn_value(value)))
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// URI-style connection string with percent-encoded user and password.
    pub fn url(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.user),
            urlencoding::encode(&self.password),
            url_host(&self.host),
            self.port,
            urlencoding::encode(&self.dbname),
        )
    }

    /// `user@host:port/dbname`, safe to log.
    pub fn redacted(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.user,
            url_host(&self.host),
            self.port,
            self.dbname
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("dbname", &self.dbname)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn parse_port(raw: &str) -> Result<u16, CredentialError> {
    raw.trim()
        .parse::<u16>()
        .map_err(|e| CredentialError::InvalidPort {
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Whether `host` names the local machine.
pub fn is_loopback(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost")
        || host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<std::net::IpAddr>()
            .is_ok_and(|ip| ip.is_loopback())
}

fn escape_dsn_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn url_host(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host.to_string()
    }
}
