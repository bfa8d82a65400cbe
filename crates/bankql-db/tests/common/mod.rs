//! Shared fixture for the scenario suites.
//!
//! Every test builds its own credentials, engine and session. Nothing is
//! cached between tests.

#![allow(dead_code)]

use std::sync::Once;

use anyhow::Result;
use bankql_core::{Credentials, QueryResult};
use bankql_db::{Engine, Session};
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Load `.env` and install the test log subscriber, once per binary.
pub fn init() {
    INIT.call_once(|| {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Fresh credentials resolved from the environment.
pub fn creds() -> Result<Credentials> {
    init();
    Ok(Credentials::from_env()?)
}

/// Database handle owned by a single test.
pub struct TestDb {
    engine: Engine,
    session: Session,
}

impl TestDb {
    /// Resolve credentials and open a session.
    pub async fn connect() -> Result<Self> {
        let engine = Engine::new(&creds()?)?;
        let session = engine.session().await?;
        Ok(Self { engine, session })
    }

    pub async fn query(&mut self, sql: &str) -> Result<QueryResult> {
        Ok(self.session.query(sql).await?)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}
