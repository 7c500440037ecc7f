use anyhow::Result;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    transport::stdio,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use super::metadata::all_tool_metadata;
use crate::engine::{Outcome, QueryEngine};
use crate::error::DbToolResult;
use crate::tools::*;

/// MCP server exposing the database tools over stdio.
pub struct DatabaseToolServer {
    engine: Arc<QueryEngine>,

    /// Enabled tool names (filtered by --tool/--tools and --readonly)
    enabled_tools: Option<HashSet<String>>,
}

impl DatabaseToolServer {
    pub fn new(engine: Arc<QueryEngine>, enabled_tools: Option<HashSet<String>>) -> Self {
        Self {
            engine,
            enabled_tools,
        }
    }

    pub fn is_enabled(&self, tool: &str) -> bool {
        self.enabled_tools
            .as_ref()
            .is_none_or(|enabled| enabled.contains(tool))
    }

    /// Serve the stdio server
    pub async fn serve_stdio(self) -> Result<()> {
        log::info!(
            "Starting stdio server with {} database(s) in the catalog",
            self.engine.catalog().len()
        );

        let service = self.serve(stdio()).await.inspect_err(|e| {
            log::error!("serving error: {e:?}");
        })?;
        service.waiting().await?;

        log::info!("Stdio server stopped");
        Ok(())
    }

    /// Run one tool with JSON arguments.
    ///
    /// `Err` is a protocol-level failure (unknown or disabled tool, bad
    /// arguments); operation failures come back inside the `Ok`.
    pub async fn dispatch(&self, tool: &str, args: Value) -> Result<DbToolResult<Outcome>, McpError> {
        if !self.is_enabled(tool) {
            return Err(McpError::invalid_params(format!("Tool '{tool}' is not enabled"), None));
        }

        let engine = &self.engine;
        let outcome = match tool {
            LIST_DATABASES => {
                let _: ListDatabasesArgs = parse_args(tool, args)?;
                Ok(engine.list_databases())
            }
            LIST_TABLES => {
                let a: ListTablesArgs = parse_args(tool, args)?;
                engine.list_tables(&a.database).await
            }
            SHOW_DATA => {
                let a: ShowDataArgs = parse_args(tool, args)?;
                engine.show_data(&a.database, &a.table, a.limit).await
            }
            SEARCH_DATA => {
                let a: SearchDataArgs = parse_args(tool, args)?;
                engine.search_data(&a.database, &a.table, &a.column, &a.value).await
            }
            ADD_DATA => {
                let a: AddDataArgs = parse_args(tool, args)?;
                engine.add_data(&a.database, &a.table, &a.data).await
            }
            DELETE_DATA => {
                let a: DeleteDataArgs = parse_args(tool, args)?;
                engine.delete_data(&a.database, &a.table, &a.condition).await
            }
            UPDATE_DATA => {
                let a: UpdateDataArgs = parse_args(tool, args)?;
                engine
                    .update_data(&a.database, &a.table, &a.set_data, &a.condition)
                    .await
            }
            JOIN_TABLES => {
                let a: JoinTablesArgs = parse_args(tool, args)?;
                engine
                    .join_tables(&a.database, &a.table1, &a.table2, &a.join_key)
                    .await
            }
            CREATE_TABLE => {
                let a: CreateTableArgs = parse_args(tool, args)?;
                engine.create_table(&a.database, &a.table_name, &a.columns).await
            }
            other => {
                return Err(McpError::invalid_params(format!("Unknown tool: {other}"), None));
            }
        };
        Ok(outcome)
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, McpError> {
    serde_json::from_value(args)
        .map_err(|e| McpError::invalid_params(format!("Invalid arguments for '{tool}': {e}"), None))
}

impl ServerHandler for DatabaseToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Database tools: call list_databases first, then list_tables, show_data, search_data or join_tables to read, and add_data, update_data, delete_data or create_table to change data.".to_string(),
            ),
        }
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool_name = request.name.clone();

        let args = match request.arguments {
            Some(map) => Value::Object(map),
            None => Value::Object(serde_json::Map::new()),
        };

        match self.dispatch(&tool_name, args).await? {
            Ok(outcome) => Ok(CallToolResult::success(vec![Content::text(outcome.into_text())])),
            Err(e) => {
                log::warn!("Tool '{tool_name}' failed ({}): {e}", e.kind());
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools: Vec<Tool> = all_tool_metadata()
            .iter()
            .filter(|tool_meta| self.is_enabled(tool_meta.name))
            .map(|tool_meta| {
                // Convert schema Value to Arc<JsonObject>
                let schema_obj = match tool_meta.schema.clone() {
                    Value::Object(obj) => Arc::new(obj),
                    _ => Arc::new(serde_json::Map::new()),
                };
                Tool::new(tool_meta.name, tool_meta.description, schema_obj)
            })
            .collect();

        log::debug!("Serving {} tools from static metadata", tools.len());

        Ok(ListToolsResult::with_all_items(tools))
    }
}
