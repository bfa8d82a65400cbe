//! Executes literal SQL and shapes the result.

use bankql_core::QueryResult;
use sqlx::postgres::PgConnection;
use sqlx::{Column, Executor, Statement};
use tracing::debug;

use crate::decode::decode_row;
use crate::error::DbError;

/// Run one literal statement on `conn` and collect every row.
///
/// The statement is prepared first, so column names are known even when
/// no rows come back. Rows keep the order the server sent them in.
pub async fn run_query(conn: &mut PgConnection, sql: &str) -> Result<QueryResult, DbError> {
    let statement = (&mut *conn).prepare(sql).await?;
    let columns: Vec<String> = statement
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let rows = statement.query().fetch_all(&mut *conn).await?;
    let values = rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?;
    let result = QueryResult::from_values(columns, values)?;

    debug!(
        sql = sql.trim(),
        rows = result.len(),
        columns = result.columns().len(),
        "query finished"
    );
    Ok(result)
}
