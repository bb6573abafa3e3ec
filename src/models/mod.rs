//! Data models for the SQL MCP gateway.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;
pub mod schema;

pub use connection::{ConnectionString, DatabaseType, ResourceBase, redact_credentials};
pub use query::{
    QUERY_TOOL_DESCRIPTION, QUERY_TOOL_NAME, QueryInput, QueryResult, Row, ToolInvocation,
};
pub use schema::{
    ColumnDescriptor, KeyRole, SCHEMA_MIME_TYPE, SCHEMA_PATH, TableResource,
    table_from_resource_uri,
};
