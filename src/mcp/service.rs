//! MCP service implementation using rmcp.
//!
//! `GatewayService` answers the four requests the gateway supports:
//! `resources/list`, `resources/read`, `tools/list` and `tools/call`.
//! Anything else falls through to rmcp's default handlers.
//!
//! The domain work lives in the `*_result` methods, which return
//! [`DbResult`]; the `ServerHandler` impl only converts at the edge.

use crate::db::DbPool;
use crate::error::{DbError, DbResult};
use crate::models::{
    QUERY_TOOL_DESCRIPTION, QUERY_TOOL_NAME, QueryInput, QueryResult, ResourceBase,
    SCHEMA_MIME_TYPE, TableResource, ToolInvocation,
};
use crate::resources::SchemaCatalog;
use crate::tools::query::QueryToolHandler;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject,
        ListResourcesResult, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        RawResource, ReadResourceRequestParam, ReadResourceResult, Resource, ResourceContents,
        ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use tracing::{debug, warn};

const SERVER_NAME: &str = "sql-mcp-gateway";

#[derive(Debug, Clone)]
pub struct GatewayService {
    /// Schema resources for the default database
    catalog: SchemaCatalog,
    /// Handler for the `query` tool
    queries: QueryToolHandler,
}

impl GatewayService {
    /// Create a service answering from `pool`, with resource URIs under `base`.
    pub fn new(pool: Arc<DbPool>, base: ResourceBase) -> Self {
        Self {
            catalog: SchemaCatalog::new(Arc::clone(&pool), base),
            queries: QueryToolHandler::new(pool),
        }
    }

    pub fn base(&self) -> &ResourceBase {
        self.catalog.base()
    }

    pub async fn list_resources_result(&self) -> DbResult<Vec<TableResource>> {
        let resources = self.catalog.list_resources().await?;
        debug!(count = resources.len(), "Listed schema resources");
        Ok(resources)
    }

    /// Pretty JSON column list for the table named by `uri`.
    pub async fn read_resource_result(&self, uri: &str) -> DbResult<String> {
        self.catalog.read_resource_text(uri).await
    }

    /// The single `query` tool with its generated input schema.
    pub fn list_tools_result(&self) -> DbResult<Vec<Tool>> {
        Ok(vec![Tool::new(
            QUERY_TOOL_NAME,
            QUERY_TOOL_DESCRIPTION,
            Arc::new(query_input_schema()?),
        )])
    }

    /// Dispatch a tool call. The tool name is resolved before the arguments
    /// are inspected, and neither step touches the pool.
    pub async fn call_tool_result(
        &self,
        name: &str,
        arguments: Option<&Map<String, JsonValue>>,
    ) -> DbResult<QueryResult> {
        match ToolInvocation::parse(name, arguments)? {
            ToolInvocation::Query(input) => self.queries.query(input).await,
        }
    }
}

fn query_input_schema() -> DbResult<JsonObject> {
    let schema = schemars::schema_for!(QueryInput);
    match serde_json::to_value(schema) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(_) => Err(DbError::internal("Query input schema is not an object")),
        Err(e) => Err(DbError::internal(format!(
            "Failed to serialize query input schema: {}",
            e
        ))),
    }
}

fn to_resource(table: TableResource) -> Resource {
    let mut raw = RawResource::new(table.uri, table.name);
    raw.mime_type = Some(table.mime_type.to_string());
    raw.no_annotation()
}

fn log_failure(operation: &str, err: &DbError) {
    if err.is_validation() {
        debug!(operation, error = %err, "Request rejected");
    } else {
        warn!(operation, error = %err, "Request failed");
    }
}

impl ServerHandler for GatewayService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: SERVER_NAME.to_owned(),
                title: Some("SQL MCP Gateway".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only access to a single SQL database.\n\
                \n\
                ## Resources\n\
                Each table is a resource at `<database>/schema/<table>`. Reading one returns\n\
                its columns as JSON: name, declared type, nullability, key role, default and extra.\n\
                \n\
                ## Tools\n\
                - `query`: run one SQL statement and get the rows back as JSON objects.\n\
                  Only statements starting with SELECT, SHOW, DESCRIBE or EXPLAIN are accepted,\n\
                  and every query runs inside a read-only transaction that is rolled back.\n\
                  A missing, empty or whitespace-only `sql` is rejected as a missing query."
                    .to_string(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources = self.list_resources_result().await.map_err(|e| {
            log_failure("resources/list", &e);
            McpError::from(e)
        })?;
        Ok(ListResourcesResult::with_all_items(
            resources.into_iter().map(to_resource).collect(),
        ))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let text = self
            .read_resource_result(&request.uri)
            .await
            .map_err(|e| {
                log_failure("resources/read", &e);
                McpError::from(e)
            })?;

        let mut contents = ResourceContents::text(text, request.uri);
        if let ResourceContents::TextResourceContents { mime_type, .. } = &mut contents {
            *mime_type = Some(SCHEMA_MIME_TYPE.to_string());
        }
        Ok(ReadResourceResult {
            contents: vec![contents],
        })
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = self.list_tools_result()?;
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let rows = self
            .call_tool_result(&request.name, request.arguments.as_ref())
            .await
            .map_err(|e| {
                log_failure("tools/call", &e);
                McpError::from(e)
            })?;

        let text = serde_json::to_string_pretty(&rows).map_err(|e| {
            McpError::from(DbError::internal(format!(
                "Failed to serialize query result: {}",
                e
            )))
        })?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}
