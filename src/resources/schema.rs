//! Schema catalog.
//!
//! Derives the resource list from live database metadata and serves each
//! table's column descriptors. Nothing is cached between calls.

use crate::db::{DbPool, SchemaInspector};
use crate::error::DbResult;
use crate::models::{ColumnDescriptor, ResourceBase, TableResource, table_from_resource_uri};
use std::sync::Arc;
use tracing::debug;

/// Resource handler for per-table schema documents.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    pool: Arc<DbPool>,
    base: ResourceBase,
}

impl SchemaCatalog {
    pub fn new(pool: Arc<DbPool>, base: ResourceBase) -> Self {
        Self { pool, base }
    }

    pub fn base(&self) -> &ResourceBase {
        &self.base
    }

    /// One resource per table or view in the current database.
    pub async fn list_resources(&self) -> DbResult<Vec<TableResource>> {
        let tables = SchemaInspector::list_tables(&self.pool).await?;
        Ok(tables
            .iter()
            .map(|table| TableResource::new(self.base.resource_uri(table), table))
            .collect())
    }

    /// Columns of the table named by `uri`.
    ///
    /// The URI is checked before any connection is acquired; an unknown table
    /// yields an empty list.
    pub async fn read_resource(&self, uri: &str) -> DbResult<Vec<ColumnDescriptor>> {
        let table = table_from_resource_uri(uri)?;
        debug!(table = %table, "Reading schema resource");
        SchemaInspector::describe_columns(&self.pool, &table).await
    }

    /// `read_resource` rendered as the pretty JSON text sent to clients.
    pub async fn read_resource_text(&self, uri: &str) -> DbResult<String> {
        let columns = self.read_resource(uri).await?;
        serde_json::to_string_pretty(&columns).map_err(|e| {
            crate::error::DbError::internal(format!("Failed to serialize schema: {}", e))
        })
    }
}
