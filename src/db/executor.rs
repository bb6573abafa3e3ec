//! Read-only query execution.
//!
//! Every caller statement runs on one pooled connection inside an explicit
//! read-only transaction:
//!
//! 1. acquire a connection (released when the `PoolConnection` drops, on
//!    every path)
//! 2. begin the read-only transaction
//! 3. run the statement verbatim as a single prepared statement, so the
//!    server refuses stacked text such as `SELECT 1; COMMIT; DELETE ...`
//! 4. roll back, on success and on failure
//!
//! A failed rollback is logged and the connection is closed instead of being
//! returned to the pool; it never replaces the statement's own result.

use crate::db::pool::{DbPool, acquire};
use crate::db::types::RowToJson;
use crate::error::DbResult;
use crate::models::{DatabaseType, QueryResult};
use sqlx::pool::PoolConnection;
use sqlx::database::HasStatementCache;
use sqlx::{Database, Executor, IntoArguments, Pool};
use std::time::Instant;
use tracing::{debug, warn};

/// Statement that opens the read-only transaction for a backend.
///
/// SQLite has no read-only transaction mode; its pools are opened read-only
/// instead.
pub fn begin_read_only(db_type: DatabaseType) -> &'static str {
    match db_type {
        DatabaseType::MySQL | DatabaseType::PostgreSQL => "START TRANSACTION READ ONLY",
        DatabaseType::SQLite => "BEGIN",
    }
}

/// Executes validated statements against a pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryExecutor;

impl QueryExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Run `sql` inside a read-only transaction and return its rows.
    ///
    /// Database failures surface as `DbError::Execution` with the driver's
    /// message intact.
    pub async fn execute_read_only(&self, pool: &DbPool, sql: &str) -> DbResult<QueryResult> {
        let start = Instant::now();
        let db_type = pool.db_type();

        let rows = impl_db_dispatch!(pool, {
            MySql(p) => run_in_read_only_transaction(p, db_type, sql).await?,
            Postgres(p) => run_in_read_only_transaction(p, db_type, sql).await?,
            SQLite(p) => run_in_read_only_transaction(p, db_type, sql).await?,
        });

        debug!(
            row_count = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Read-only query finished"
        );
        Ok(rows)
    }
}

async fn run_in_read_only_transaction<DB>(
    pool: &Pool<DB>,
    db_type: DatabaseType,
    sql: &str,
) -> DbResult<QueryResult>
where
    DB: Database + HasStatementCache,
    DB::Row: RowToJson,
    for<'c> &'c mut DB::Connection: Executor<'c, Database = DB>,
    for<'q> DB::Arguments<'q>: IntoArguments<'q, DB>,
{
    let mut conn = acquire(pool, db_type).await?;

    let outcome = fetch_rows(&mut conn, begin_read_only(db_type), sql).await;
    end_transaction(&mut conn).await;

    let rows = outcome?;
    Ok(rows.iter().map(RowToJson::to_json_map).collect())
}

async fn fetch_rows<DB>(
    conn: &mut PoolConnection<DB>,
    begin: &'static str,
    sql: &str,
) -> Result<Vec<DB::Row>, sqlx::Error>
where
    DB: Database + HasStatementCache,
    for<'c> &'c mut DB::Connection: Executor<'c, Database = DB>,
    for<'q> DB::Arguments<'q>: IntoArguments<'q, DB>,
{
    (&mut **conn).execute(begin).await?;
    // A bare &str would go out as a simple query, which MySQL and PostgreSQL
    // split on `;`. Ad hoc SQL stays out of the statement cache.
    sqlx::query(sql)
        .persistent(false)
        .fetch_all(&mut **conn)
        .await
}

/// Roll back whatever the statement left open.
///
/// On failure the connection is marked to close on drop, so the pool never
/// hands out a connection stuck in a transaction.
async fn end_transaction<DB>(conn: &mut PoolConnection<DB>)
where
    DB: Database,
    for<'c> &'c mut DB::Connection: Executor<'c, Database = DB>,
{
    if let Err(e) = (&mut **conn).execute("ROLLBACK").await {
        warn!(error = %e, "Could not roll back transaction");
        conn.close_on_drop();
    }
}
