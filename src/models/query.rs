//! Query-related data models.
//!
//! Tool arguments arrive as an untyped JSON object. They are turned into a
//! [`ToolInvocation`] up front so handlers only ever see validated shapes.

use crate::error::{DbError, DbResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Name of the single tool this gateway exposes.
pub const QUERY_TOOL_NAME: &str = "query";

/// Description advertised by `tools/list`.
pub const QUERY_TOOL_DESCRIPTION: &str = "Run a read-only SQL query against the database";

/// One result row, keyed by column name in select-list order.
pub type Row = Map<String, JsonValue>;

/// Rows returned by the query tool.
pub type QueryResult = Vec<Row>;

/// Input for the `query` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// The SQL query to execute (SELECT, SHOW, DESCRIBE and EXPLAIN statements only)
    pub sql: String,
}

/// A call-tool request whose name and arguments have been checked.
#[derive(Debug, Clone)]
pub enum ToolInvocation {
    Query(QueryInput),
}

impl ToolInvocation {
    /// Resolve a tool name and its raw arguments.
    ///
    /// Unknown names fail with `UnknownTool` before the arguments are looked
    /// at. For `query`, a missing, null or empty `sql` is `MissingQuery`; a
    /// `sql` that is not a string is `InvalidArguments`. Extra keys are
    /// ignored.
    pub fn parse(name: &str, arguments: Option<&Map<String, JsonValue>>) -> DbResult<Self> {
        if name != QUERY_TOOL_NAME {
            return Err(DbError::unknown_tool(name));
        }

        let sql = match arguments.and_then(|args| args.get("sql")) {
            None | Some(JsonValue::Null) => return Err(DbError::MissingQuery),
            Some(JsonValue::String(sql)) => sql.clone(),
            Some(other) => {
                return Err(DbError::invalid_arguments(format!(
                    "'sql' must be a string, got {}",
                    json_type_name(other)
                )));
            }
        };

        if sql.trim().is_empty() {
            return Err(DbError::MissingQuery);
        }

        Ok(Self::Query(QueryInput { sql }))
    }

    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::Query(_) => QUERY_TOOL_NAME,
        }
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_query() {
        let invocation =
            ToolInvocation::parse("query", Some(&args(json!({"sql": "SELECT 1"})))).unwrap();
        let ToolInvocation::Query(input) = invocation;
        assert_eq!(input.sql, "SELECT 1");
    }

    #[test]
    fn test_parse_ignores_extra_keys() {
        let invocation = ToolInvocation::parse(
            "query",
            Some(&args(json!({"sql": "SELECT 1", "limit": 5}))),
        )
        .unwrap();
        assert_eq!(invocation.tool_name(), "query");
    }

    #[test]
    fn test_parse_unknown_tool_wins_over_bad_arguments() {
        let err = ToolInvocation::parse("execute", None).unwrap_err();
        assert!(matches!(err, DbError::UnknownTool { name } if name == "execute"));
    }

    #[test]
    fn test_parse_missing_sql() {
        for arguments in [None, Some(args(json!({}))), Some(args(json!({"sql": null})))] {
            let err = ToolInvocation::parse("query", arguments.as_ref()).unwrap_err();
            assert!(matches!(err, DbError::MissingQuery));
        }
        let err = ToolInvocation::parse("query", Some(&args(json!({"sql": "  \n"})))).unwrap_err();
        assert!(matches!(err, DbError::MissingQuery));
    }

    #[test]
    fn test_parse_wrong_type() {
        let err = ToolInvocation::parse("query", Some(&args(json!({"sql": 42})))).unwrap_err();
        assert!(matches!(err, DbError::InvalidArguments { .. }));
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn test_query_input_schema_requires_sql() {
        let schema = serde_json::to_value(schemars::schema_for!(QueryInput)).unwrap();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["sql"]["type"], "string");
        assert_eq!(schema["required"], json!(["sql"]));
    }
}
