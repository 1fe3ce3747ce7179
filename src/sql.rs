//! Ad-hoc SQL execution

use tracing::info;

use crate::database::{Connection, DatabaseError, DatabaseResult, QueryResult};
use crate::models::quote_ident;

/// Replace `table` with the result of a query, returning its row count
pub fn materialize<C: Connection + ?Sized>(
    conn: &C,
    table: &str,
    sql: &str,
) -> DatabaseResult<u64> {
    let body = strip_terminator(sql);
    if body.is_empty() {
        return Err(DatabaseError::InvalidInput(
            "SQL script is empty".to_string(),
        ));
    }

    let statement = format!(
        "CREATE OR REPLACE TABLE {} AS (\n{}\n)",
        quote_ident(table),
        body
    );
    conn.execute(&statement, &[])?;

    let count = row_count(conn, table)?;
    info!("Record Count {} for {}", count, table);
    Ok(count)
}

/// Run a script and return the rows of its final statement
pub fn run_script<C: Connection + ?Sized>(conn: &C, sql: &str) -> DatabaseResult<QueryResult> {
    let body = strip_terminator(sql);
    if body.is_empty() {
        return Ok(QueryResult::empty());
    }
    conn.query(body, &[])
}

/// Number of rows currently in `table`
pub fn row_count<C: Connection + ?Sized>(conn: &C, table: &str) -> DatabaseResult<u64> {
    let result = conn.query(&format!("SELECT COUNT(*) FROM {}", quote_ident(table)), &[])?;
    result
        .scalar()
        .and_then(|v| v.as_u64())
        .ok_or_else(|| DatabaseError::QueryFailed(format!("No row count returned for {}", table)))
}

fn strip_terminator(sql: &str) -> &str {
    sql.trim().trim_end_matches(';').trim_end()
}
