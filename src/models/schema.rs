//! Schema-related data models.
//!
//! Tables are exposed as resources addressed `<base>/schema/<table>`; reading
//! one yields its columns as [`ColumnDescriptor`]s in ordinal order.

use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use url::Url;

/// Path segment that precedes the table name in every resource URI.
pub const SCHEMA_PATH: &str = "schema";

/// Mime type advertised for schema documents.
pub const SCHEMA_MIME_TYPE: &str = "application/json";

/// A table as listed by `resources/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableResource {
    pub uri: String,
    /// Human-readable label, `"<table>" database schema`
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
}

impl TableResource {
    pub fn new(uri: impl Into<String>, table: &str) -> Self {
        Self {
            uri: uri.into(),
            name: format!("\"{}\" database schema", table),
            mime_type: SCHEMA_MIME_TYPE,
        }
    }
}

/// Role a column plays in the table's keys.
///
/// When a column has several roles the strongest wins:
/// primary, then unique, then foreign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    #[default]
    None,
    Primary,
    Unique,
    Foreign,
}

impl KeyRole {
    /// Pick the strongest role from the individual flags.
    pub fn from_flags(primary: bool, unique: bool, foreign: bool) -> Self {
        if primary {
            Self::Primary
        } else if unique {
            Self::Unique
        } else if foreign {
            Self::Foreign
        } else {
            Self::None
        }
    }
}

/// One column of a table's schema document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub declared_type: String,
    pub nullable: bool,
    pub key_role: KeyRole,
    pub default_value: Option<String>,
    /// Engine-specific attributes such as `auto_increment` or `GENERATED`.
    pub extra: String,
}

/// Extract the table name from a schema resource URI.
///
/// The last path segment is the table and the one before it must be
/// `schema`; anything else is an `InvalidResourceUri`.
pub fn table_from_resource_uri(uri: &str) -> DbResult<String> {
    let parsed = Url::parse(uri).map_err(|_| DbError::invalid_resource_uri(uri))?;

    let mut segments = parsed.path().split('/');
    let table = segments.next_back();
    let schema = segments.next_back();

    match (schema, table) {
        (Some(SCHEMA_PATH), Some(table)) if !table.is_empty() => Ok(table.to_string()),
        _ => Err(DbError::invalid_resource_uri(uri)),
    }
}
