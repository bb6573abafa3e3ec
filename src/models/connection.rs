//! Connection-related data models.
//!
//! The connection string is the only credential-bearing value in the gateway.
//! It is wrapped in [`ConnectionString`] so that formatting it anywhere yields
//! the redacted form produced by [`redact_credentials`].

use crate::error::{DbError, DbResult};
use serde::Serialize;
use url::Url;

/// Supported database types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// Includes MariaDB
    MySQL,
    PostgreSQL,
    SQLite,
}

impl DatabaseType {
    /// Parse database type from a connection string.
    pub fn from_connection_string(connection_string: &str) -> Option<Self> {
        let lower = connection_string.trim_start().to_lowercase();
        if lower.starts_with("mysql://") || lower.starts_with("mariadb://") {
            Some(Self::MySQL)
        } else if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Some(Self::PostgreSQL)
        } else if lower.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else {
            None
        }
    }

    /// Scheme used for resource URIs, whatever alias the caller configured.
    pub fn canonical_scheme(&self) -> &'static str {
        match self {
            Self::MySQL => "mysql",
            Self::PostgreSQL => "postgres",
            Self::SQLite => "sqlite",
        }
    }

    /// Get the display name for this database type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MySQL => "MySQL",
            Self::PostgreSQL => "PostgreSQL",
            Self::SQLite => "SQLite",
        }
    }

    /// Get the default port for this database type.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::MySQL => Some(3306),
            Self::PostgreSQL => Some(5432),
            Self::SQLite => None,
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Replace every `:<secret>@` run with `:****@`.
///
/// A secret is one or more characters other than `:`, `@` and `/`. A URL
/// password cannot hold a raw `/`, so in `mysql://root@host` the `//root`
/// after the scheme colon is not mistaken for one. Strings without
/// credentials are returned unchanged.
pub fn redact_credentials(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(colon) = rest.find(':') {
        out.push_str(&rest[..colon]);
        let after = &rest[colon + 1..];
        let secret_len = after.find([':', '@', '/']).unwrap_or(after.len());

        if secret_len > 0 && after[secret_len..].starts_with('@') {
            out.push_str(":****@");
            rest = &after[secret_len + 1..];
        } else {
            out.push(':');
            rest = after;
        }
    }

    out.push_str(rest);
    out
}

/// A database connection string.
///
/// `Display` and `Debug` both print the redacted form. Use [`expose`] only
/// when handing the value to the driver or using it as a registry key.
///
/// [`expose`]: ConnectionString::expose
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConnectionString {
    raw: String,
    db_type: DatabaseType,
}

impl ConnectionString {
    /// Wrap a connection string, detecting its backend from the scheme.
    pub fn parse(raw: impl Into<String>) -> DbResult<Self> {
        let raw = raw.into().trim().to_string();
        if raw.is_empty() {
            return Err(DbError::configuration("Database connection URL is empty"));
        }

        let db_type = DatabaseType::from_connection_string(&raw).ok_or_else(|| {
            DbError::configuration(format!(
                "Unsupported database scheme in {}; expected mysql://, postgres:// or sqlite:",
                redact_credentials(&raw)
            ))
        })?;

        Ok(Self { raw, db_type })
    }

    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    /// The unredacted value.
    pub fn expose(&self) -> &str {
        &self.raw
    }

    pub fn redacted(&self) -> String {
        redact_credentials(&self.raw)
    }

    /// Derive the base under which every resource URI is addressed.
    pub fn resource_base(&self) -> DbResult<ResourceBase> {
        ResourceBase::from_connection_string(self)
    }
}

impl std::fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl std::fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionString")
            .field("db_type", &self.db_type)
            .field("url", &self.redacted())
            .finish()
    }
}

/// Password-free, canonical-scheme prefix of every resource URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBase(String);

impl ResourceBase {
    fn from_connection_string(conn: &ConnectionString) -> DbResult<Self> {
        let mut url = Url::parse(conn.expose()).map_err(|e| {
            DbError::configuration(format!(
                "Cannot derive resource URI from {}: {}",
                conn.redacted(),
                e
            ))
        })?;

        url.set_scheme(conn.db_type().canonical_scheme())
            .map_err(|_| {
                DbError::configuration(format!(
                    "Cannot normalize scheme of {}",
                    conn.redacted()
                ))
            })?;
        // Opaque URLs such as `sqlite:data.db` carry no userinfo to clear.
        if url.password().is_some() {
            url.set_password(None).map_err(|_| {
                DbError::configuration(format!(
                    "Cannot strip credentials from {}",
                    conn.redacted()
                ))
            })?;
        }
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self(url.as_str().trim_end_matches('/').to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URI of the schema document for `table`.
    pub fn resource_uri(&self, table: &str) -> String {
        format!("{}/{}/{}", self.0, super::SCHEMA_PATH, table)
    }
}

impl std::fmt::Display for ResourceBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
