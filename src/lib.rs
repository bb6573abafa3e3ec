//! SQL MCP Gateway Library
//!
//! Serves a single SQL database (SQLite, PostgreSQL, MySQL) over MCP: one
//! JSON schema resource per table and a `query` tool that only runs
//! read-only statements.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod resources;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::{DbError, DbResult};
pub use mcp::GatewayService;
