//! Query execution tool.
//!
//! This module implements the `query` MCP tool. Statements are validated
//! before any connection is touched, then run through the read-only
//! executor on the gateway's default pool.

use crate::db::{DbPool, QueryExecutor};
use crate::error::DbResult;
use crate::models::{QueryInput, QueryResult};
use crate::tools::sql_validator;
use std::sync::Arc;
use tracing::{debug, info};

/// Handler for the `query` tool.
#[derive(Debug, Clone)]
pub struct QueryToolHandler {
    pool: Arc<DbPool>,
    executor: QueryExecutor,
}

impl QueryToolHandler {
    /// Create a new query tool handler on `pool`.
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self {
            pool,
            executor: QueryExecutor::new(),
        }
    }

    /// Execute a read-only query from tool input.
    pub async fn query(&self, input: QueryInput) -> DbResult<QueryResult> {
        self.execute_query(&input.sql).await
    }

    /// Validate and run `sql`, returning its rows.
    ///
    /// `MissingQuery` and `WriteNotAllowed` are returned without acquiring a
    /// connection. Database failures come back as `Execution` errors.
    pub async fn execute_query(&self, sql: &str) -> DbResult<QueryResult> {
        sql_validator::validate_readonly(sql)?;
        debug!(sql = %sql, "Executing read-only query");

        let rows = self.executor.execute_read_only(&self.pool, sql).await?;

        info!(
            db_type = %self.pool.db_type(),
            row_count = rows.len(),
            "Query executed"
        );
        Ok(rows)
    }
}
