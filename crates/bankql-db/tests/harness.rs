//! Behavior of the connection harness itself.
//!
//! Connectivity failures run against a closed local port and need no
//! server. The remaining tests need the seeded database. Tests that change
//! the process environment live in `env_credentials.rs`.

mod common;

use std::time::{Duration, Instant};

use anyhow::Result;
use bankql_core::{Credentials, Value, assert_decimal_eq, assert_row_count, dec};
use bankql_db::{DbError, Engine, connect_driver};
use common::TestDb;

/// Nothing listens on the TCP port multiplexer port.
const CLOSED_PORT: u16 = 1;

fn closed_port_creds() -> Credentials {
    Credentials {
        port: CLOSED_PORT,
        ..Credentials::default()
    }
}

#[tokio::test]
async fn driver_connect_to_closed_port_is_connection_error() {
    let Err(err) = connect_driver(&closed_port_creds()).await else {
        panic!("connecting to a closed port succeeded");
    };
    assert!(matches!(err, DbError::Connection(_)), "got {err:?}");
}

#[tokio::test]
async fn session_on_closed_port_fails_fast_with_the_refusal() {
    let engine = Engine::new(&closed_port_creds()).expect("engine creation does not connect");
    assert_eq!(engine.target(), "postgres@127.0.0.1:1/postgres");

    let started = Instant::now();
    let Err(err) = engine.session().await else {
        panic!("session on a closed port succeeded");
    };
    let elapsed = started.elapsed();

    let DbError::Connection(message) = &err else {
        panic!("expected a connection error, got {err:?}");
    };
    assert!(
        message.to_lowercase().contains("refused"),
        "refusal cause lost: {message}"
    );
    assert!(elapsed < Duration::from_secs(2), "no fast failure: {elapsed:?}");
}

#[tokio::test]
#[ignore = "requires PostgreSQL loaded with the banking schema and insert_data.sql"]
async fn repeated_query_returns_identical_results() -> Result<()> {
    let sql = r"
        SELECT branch.name, SUM(bank_card.balance) AS total_deposit
        FROM branch JOIN bank_card ON branch.id = bank_card.branch_id
        GROUP BY branch.id
        ORDER BY total_deposit;
    ";
    let mut db = TestDb::connect().await?;
    let first = db.query(sql).await?;
    let second = db.query(sql).await?;

    assert_eq!(first.len(), second.len());
    assert_eq!(first.columns(), second.columns());
    for (a, b) in first.rows().iter().zip(second.rows()) {
        assert_eq!(a.text("name")?, b.text("name")?);
        assert_decimal_eq(a.decimal("total_deposit")?, b.decimal("total_deposit")?, dec("0.01"));
    }
    Ok(())
}

#[tokio::test]
#[ignore = "requires PostgreSQL loaded with the banking schema and insert_data.sql"]
async fn zero_row_result_keeps_columns() -> Result<()> {
    let mut db = TestDb::connect().await?;
    let result = db
        .query("SELECT id, name FROM customer WHERE id < 0;")
        .await?;

    assert_row_count(&result, 0);
    assert_eq!(result.columns(), &["id".to_string(), "name".to_string()]);
    assert!(result.first().is_err());
    assert_eq!(result.max_decimal("id")?, None);
    Ok(())
}

#[tokio::test]
#[ignore = "requires PostgreSQL loaded with the banking schema and insert_data.sql"]
async fn missing_relation_is_schema_error() -> Result<()> {
    let mut db = TestDb::connect().await?;
    let err = db
        .query("SELECT * FROM no_such_view;")
        .await
        .expect_err("query against a missing view succeeded");

    let err = err.downcast::<DbError>()?;
    assert!(matches!(err, DbError::Schema(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
#[ignore = "requires PostgreSQL loaded with the banking schema and insert_data.sql"]
async fn sessions_from_one_engine_are_independent() -> Result<()> {
    let engine = Engine::new(&common::creds()?)?;

    {
        let mut session = engine.session().await?;
        session.query("SELECT 1 AS one;").await?;
    }

    let mut session = engine.session().await?;
    let result = session.query("SELECT 1 AS one;").await?;
    assert_eq!(result.first()?.i64("one")?, 1);
    session.close().await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires PostgreSQL loaded with the banking schema and insert_data.sql"]
async fn unlisted_column_types_do_not_fail_the_query() -> Result<()> {
    let mut db = TestDb::connect().await?;
    let result = db
        .query("SELECT '10.0.0.7'::inet AS ip, 'Jane Doe'::text AS name;")
        .await?;

    let row = result.first()?;
    assert!(matches!(row.get("ip"), Some(Value::Other { type_name, .. }) if type_name == "INET"));
    assert_eq!(row.text("name")?, "Jane Doe");
    Ok(())
}

#[tokio::test]
#[ignore = "requires PostgreSQL loaded with the banking schema and insert_data.sql"]
async fn driver_connection_runs_queries() -> Result<()> {
    let mut conn = connect_driver(&common::creds()?).await?;
    conn.ping().await?;

    let result = conn.query("SELECT COUNT(*) AS branches FROM branch;").await?;
    assert_eq!(result.first()?.i64("branches")?, 3);
    conn.close().await?;
    Ok(())
}
