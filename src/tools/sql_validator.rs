//! SQL statement validation for read-only enforcement.
//!
//! The `query` tool accepts a statement only if, after trimming, it starts
//! with one of the read keywords below (case-insensitive). This is a prefix
//! check, not a parser: stacked statements and comment tricks are not
//! detected here. The read-only transaction the gate opens around every
//! query is what the database itself enforces.

use crate::error::{DbError, DbResult};

/// Leading keywords accepted by the query tool.
pub const ALLOWED_PREFIXES: [&str; 4] = ["SELECT", "SHOW", "DESCRIBE", "EXPLAIN"];

/// Validate that `sql` is a read statement.
///
/// Empty or whitespace-only input is `MissingQuery`; anything not starting
/// with an allowed keyword is `WriteNotAllowed`. The caller executes the
/// original text; the uppercase copy is only inspected.
pub fn validate_readonly(sql: &str) -> DbResult<()> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return Err(DbError::MissingQuery);
    }

    let normalized = trimmed.to_uppercase();
    if ALLOWED_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
    {
        Ok(())
    } else {
        Err(DbError::WriteNotAllowed)
    }
}
