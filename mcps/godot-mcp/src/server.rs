//! MCP Server exposing the Godot editor to agents
//!
//! Tools and resources are thin: each forwards to the editor through the
//! shared [`CommandBridge`]. Handler implementations are in the handlers
//! module.

use mcp_common::{resource_not_found, CallToolResult, McpError, ResultExt};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        Implementation, ListResourcesResult, PaginatedRequestParam, ReadResourceRequestParam,
        ReadResourceResult, ResourceContents, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router, RoleServer,
};

use crate::bridge::CommandBridge;
use crate::handlers;
use crate::params::*;
use crate::resources::{self, RESOURCES};

/// The Godot MCP Server
///
/// Cloned once per MCP session; every clone shares the same bridge.
#[derive(Clone)]
pub struct GodotMcpServer {
    bridge: CommandBridge,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl GodotMcpServer {
    pub fn new(bridge: CommandBridge) -> Self {
        Self {
            bridge,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Read the contents of a file in the Godot project")]
    async fn read_file(
        &self,
        Parameters(params): Parameters<ReadFileParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::read_file(&self.bridge, params).await
    }

    #[tool(description = "Write content to a file in the Godot project")]
    async fn write_file(
        &self,
        Parameters(params): Parameters<WriteFileParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::write_file(&self.bridge, params).await
    }

    #[tool(description = "List files in a directory with optional extension filtering")]
    async fn list_files(
        &self,
        Parameters(params): Parameters<ListFilesParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::list_files(&self.bridge, params).await
    }

    #[tool(description = "Lists all MCP resources available on the server.")]
    async fn list_mcp_resources(
        &self,
        Parameters(_params): Parameters<ListMcpResourcesParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::list_mcp_resources().await
    }
}

#[tool_handler]
impl rmcp::ServerHandler for GodotMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Bridge to a running Godot editor. Tools read and write project files; \
                 resources expose project structure, settings, resources and logs. \
                 Commands fail with a readable error when the editor is not reachable."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(
            RESOURCES.iter().map(|def| def.to_resource()).collect(),
        ))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let def = resources::find(&request.uri).ok_or_else(|| resource_not_found(&request.uri))?;
        let text = def
            .load(&self.bridge)
            .await
            .inspect_err(|e| tracing::warn!("Failed to load resource {}: {}", def.uri, e))
            .to_mcp_err()?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::TextResourceContents {
                uri: request.uri,
                mime_type: Some(def.mime_type.to_string()),
                text,
                meta: None,
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeConfig;
    use rmcp::ServerHandler;

    #[test]
    fn test_info_names_this_server() {
        let server = GodotMcpServer::new(CommandBridge::websocket(BridgeConfig::default()));
        let info = server.get_info();
        assert_eq!(info.server_info.name, "godot-mcp");
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
        assert!(info.capabilities.resources.is_some());
    }
}
