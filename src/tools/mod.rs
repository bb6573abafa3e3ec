//! MCP tool implementations.
//!
//! - `query`: run a read-only statement and return its rows
//! - `sql_validator`: statement-prefix check used before any connection is taken

pub mod query;
pub mod sql_validator;

pub use query::QueryToolHandler;
