//! Environment isolation for tests that touch the `DB*` variables.

use std::env;
use std::sync::Mutex;

use crate::credentials::{ENV_DBHOST, ENV_DBNAME, ENV_DBPASSWORD, ENV_DBPORT, ENV_DBUSER};

/// Serializes tests that read or write process environment variables.
pub static ENV_LOCK: Mutex<()> = Mutex::new(());

/// All variables consulted by [`crate::Credentials::from_env`].
pub const CREDENTIAL_VARS: [&str; 5] =
    [ENV_DBNAME, ENV_DBHOST, ENV_DBPORT, ENV_DBUSER, ENV_DBPASSWORD];

/// RAII guard that restores an environment variable to its original value on drop.
///
/// ```ignore
/// let _lock = ENV_LOCK.lock().unwrap();
/// let _port = EnvVarGuard::set("DBPORT", "6543");
/// ```
pub struct EnvVarGuard {
    key: String,
    previous: Option<String>,
}

impl EnvVarGuard {
    /// Set `key` to `value` until the guard is dropped.
    #[allow(unsafe_code)]
    pub fn set(key: &str, value: &str) -> Self {
        let previous = env::var(key).ok();
        unsafe {
            env::set_var(key, value);
        }
        Self {
            key: key.to_string(),
            previous,
        }
    }

    /// Remove `key` until the guard is dropped.
    #[allow(unsafe_code)]
    pub fn unset(key: &str) -> Self {
        let previous = env::var(key).ok();
        unsafe {
            env::remove_var(key);
        }
        Self {
            key: key.to_string(),
            previous,
        }
    }

    /// Clear every credential variable.
    pub fn unset_all_credentials() -> Vec<Self> {
        CREDENTIAL_VARS.iter().map(|key| Self::unset(key)).collect()
    }
}

impl Drop for EnvVarGuard {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        if let Some(ref value) = self.previous {
            unsafe {
                env::set_var(&self.key, value);
            }
        } else {
            unsafe {
                env::remove_var(&self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{Credentials, DEFAULT_PORT};

    #[test]
    fn test_from_env_reads_variables_fresh() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _clear = EnvVarGuard::unset_all_credentials();

        assert_eq!(Credentials::from_env().unwrap().port, DEFAULT_PORT);

        let _port = EnvVarGuard::set(ENV_DBPORT, "6543");
        assert_eq!(Credentials::from_env().unwrap().port, 6543);
    }

    #[test]
    fn test_guard_restores_previous_value() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _outer = EnvVarGuard::set(ENV_DBNAME, "outer");
        {
            let _inner = EnvVarGuard::set(ENV_DBNAME, "inner");
            assert_eq!(env::var(ENV_DBNAME).unwrap(), "inner");
        }
        assert_eq!(env::var(ENV_DBNAME).unwrap(), "outer");
    }
}
