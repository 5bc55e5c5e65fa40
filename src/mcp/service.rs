//! MCP service implementation using rmcp.
//!
//! This module defines the ExplorerService struct with the three explorer
//! tools exposed via the MCP protocol using the rmcp framework's macros.
//! The `#[tool_router]` attribute builds the operation-name to handler
//! registry once at service construction; no reflection happens at call
//! time.

use crate::config::Config;
use crate::db::{ConnectionManager, QueryExecutor};
use crate::tools::query::{QueryToolHandler, ReadQueryInput, ReadQueryOutput};
use crate::tools::schema::{
    DescribeTableInput, DescribeTableOutput, ListTablesOutput, SchemaToolHandler,
};
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

#[derive(Clone)]
pub struct ExplorerService {
    /// Shared connection manager; each tool call acquires its own connection
    connections: std::sync::Arc<ConnectionManager>,
    /// Executor carrying the configured limits and timeout
    executor: QueryExecutor,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl ExplorerService {
    /// Create a new ExplorerService from the server configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            connections: std::sync::Arc::new(ConnectionManager::new(config)),
            executor: QueryExecutor::new(config),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl ExplorerService {
    #[tool(
        description = "Execute a SELECT query (including WITH clauses) and return results.\nSupports positional ? parameters to prevent SQL injection.\nWrite operations and statement stacking are rejected before execution.\nResults are capped by row_limit; truncated=true means more rows were available."
    )]
    async fn read_query(
        &self,
        Parameters(input): Parameters<ReadQueryInput>,
    ) -> Result<Json<ReadQueryOutput>, McpError> {
        let handler = QueryToolHandler::new(self.connections.clone(), self.executor.clone());
        handler.read_query(input).await.map(Json).map_err(Into::into)
    }

    #[tool(
        description = "List all user tables in the database, in declaration order.\nInternal SQLite tables (sqlite_*) are excluded."
    )]
    async fn list_tables(&self) -> Result<Json<ListTablesOutput>, McpError> {
        let handler = SchemaToolHandler::new(self.connections.clone());
        handler.list_tables().await.map(Json).map_err(Into::into)
    }

    #[tool(
        description = "Get detailed schema information for a table.\nReturns column names, declared types, nullability, primary key membership, and default values."
    )]
    async fn describe_table(
        &self,
        Parameters(input): Parameters<DescribeTableInput>,
    ) -> Result<Json<DescribeTableOutput>, McpError> {
        let handler = SchemaToolHandler::new(self.connections.clone());
        handler
            .describe_table(input)
            .await
            .map(Json)
            .map_err(Into::into)
    }
}

#[tool_handler]
impl ServerHandler for ExplorerService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "sqlite-explorer-mcp".to_owned(),
                title: Some("SQLite Explorer MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only SQL access to a SQLite database.\n\
                \n\
                ## Workflow\n\
                1. Call `list_tables` to see available tables\n\
                2. Call `describe_table` to inspect a table's columns\n\
                3. Call `read_query` with a SELECT statement\n\
                \n\
                ## Rules\n\
                - Only single SELECT statements (including WITH clauses) are accepted\n\
                - Use ? placeholders and the `params` array for user-supplied values\n\
                - Results are capped by `row_limit`; check `truncated` and narrow the\n\
                  query (e.g. with WHERE or OFFSET) to page through large results\n\
                \n\
                ## Errors\n\
                Validation errors (read-only violations, statement stacking, bad\n\
                identifiers, bad row limits) are deterministic - correct the query\n\
                before retrying. Execution errors carry the engine's message."
                    .to_string(),
            ),
        }
    }
}
