//! MCP resource implementations.
//!
//! - `schema`: one JSON schema document per table, addressed `<base>/schema/<table>`

pub mod schema;

pub use schema::SchemaCatalog;
