//! Error types for the SQL MCP gateway.
//!
//! Every failure a request can hit is a `DbError` variant. Startup code treats
//! `Configuration` and `Connection` as fatal; the MCP handlers convert any
//! variant into an `rmcp::ErrorData` so one bad request never ends the server.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Neither `DATABASE_URL` nor the positional argument holds a value.
    #[error("Missing database connection URL")]
    MissingConnectionUrl,

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Invalid resource URI: {uri}")]
    InvalidResourceUri { uri: String },

    #[error("SQL query is required")]
    MissingQuery,

    #[error("Only SELECT, SHOW, DESCRIBE, and EXPLAIN queries are allowed")]
    WriteNotAllowed,

    #[error("Query failed: {message}")]
    Execution {
        message: String,
        /// e.g., "42S02" for an unknown table on MySQL
        sql_state: Option<String>,
    },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    pub fn invalid_resource_uri(uri: impl Into<String>) -> Self {
        Self::InvalidResourceUri { uri: uri.into() }
    }

    /// Create an execution error preserving the database's message.
    pub fn execution(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Execution {
            message: message.into(),
            sql_state,
        }
    }

    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool { name: name.into() }
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::InvalidResourceUri { .. } => {
                Some("Use a URI returned by resources/list: <base>/schema/<table>")
            }
            Self::MissingQuery => Some("Pass the statement in the 'sql' argument"),
            Self::WriteNotAllowed => Some("This gateway is read-only; rewrite as a SELECT"),
            Self::Execution { .. } => Some("Check the SQL syntax and referenced objects"),
            Self::UnknownTool { .. } => Some("The only available tool is 'query'"),
            _ => None,
        }
    }

    /// True for errors raised before any connection is touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidResourceUri { .. }
                | Self::MissingQuery
                | Self::WriteNotAllowed
                | Self::UnknownTool { .. }
                | Self::InvalidArguments { .. }
        )
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::configuration(msg.to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::execution(db_err.message(), code)
            }
            sqlx::Error::RowNotFound => DbError::execution("No rows returned", None),
            sqlx::Error::PoolTimedOut => DbError::connection(
                "Timed out waiting for a pooled connection",
                "All connections are busy; retry or raise --max-connections",
            ),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Restart the gateway")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for gateway operations.
pub type DbResult<T> = Result<T, DbError>;

fn suggestion_data(suggestion: Option<&str>) -> Option<serde_json::Value> {
    suggestion.map(|s| serde_json::json!({ "suggestion": s }))
}

/// Convert DbError to MCP ErrorData.
/// Includes the suggestion field in the `data` object when available.
impl From<DbError> for rmcp::ErrorData {
    fn from(err: DbError) -> Self {
        let data = suggestion_data(err.suggestion());
        match &err {
            DbError::InvalidResourceUri { .. } => {
                rmcp::ErrorData::resource_not_found(err.to_string(), data)
            }

            DbError::MissingQuery
            | DbError::WriteNotAllowed
            | DbError::UnknownTool { .. }
            | DbError::InvalidArguments { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), data)
            }

            // Keep the database's own wording; SQLSTATE goes last.
            DbError::Execution { message, sql_state } => {
                let msg = match sql_state {
                    Some(code) => format!("{} (SQLSTATE: {})", message, code),
                    None => message.clone(),
                };
                rmcp::ErrorData::invalid_params(msg, data)
            }

            DbError::Configuration { .. }
            | DbError::MissingConnectionUrl
            | DbError::Connection { .. }
            | DbError::Internal { .. } => {
                rmcp::ErrorData::internal_error(err.to_string(), data)
            }
        }
    }
}
