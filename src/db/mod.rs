//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Pool registry (one pool per connection string)
//! - Read-only query execution
//! - Schema introspection
//! - Row to JSON conversion
//! - Database dispatch macros for reducing code duplication

#[macro_use]
pub mod macros;
pub mod executor;
pub mod pool;
pub mod schema;
pub mod types;

pub use executor::QueryExecutor;
pub use pool::{DbPool, PoolRegistry};
pub use schema::SchemaInspector;
