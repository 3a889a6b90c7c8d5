//! MCP server handler implementation.
//!
//! Routes tool calls to the worker event they simulate.
use std::sync::Arc;

use crate::tools::{
    WorkerContext,
    cache::{CacheEntriesParams, entries_impl, keys_impl},
    fetch::{SwFetchParams, fetch_impl},
    lifecycle::{activate_impl, install_impl},
    message::{SwMessageParams, message_impl},
    notification::{SwNotificationClickParams, click_impl},
    push::{SwPushParams, push_impl},
    status::status_impl,
    sync::{SwSyncParams, sync_impl},
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for swcache-mcp.
#[derive(Clone)]
pub struct SwCacheServer {
    ctx: Arc<WorkerContext>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl SwCacheServer {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx: Arc::new(ctx), tool_router: Self::tool_router() }
    }

    #[tool(description = "Run the install event: precache the app shell into the current cache version. \
                          All-or-nothing; a failed install marks the worker redundant.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.ctx).await
    }

    #[tool(description = "Run the activate event: delete every cache store except the current version \
                          and claim open clients. Requires a successful install first.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.ctx).await
    }

    /// Dispatch a fetch event.
    ///
    /// GET requests are answered cache-first with network fallback; other
    /// methods pass through to the network untouched.
    #[tool(description = "Dispatch a fetch event through the worker. Returns the response and whether it came \
                          from the cache, the network, the offline index fallback, or an offline 503.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Post a message to the worker. {\"type\": \"SKIP_WAITING\"} promotes it immediately.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Fire a background sync event with the given tag.")]
    async fn sw_sync(&self, params: Parameters<SwSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Deliver a push message. JSON data {title?, body?, url?} shows a notification.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Click a notification. The \"view\" action focuses or opens the app window.")]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        click_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Report worker state, host activity and failed background cache writes.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.ctx).await
    }

    #[tool(description = "List cache stores with their lifecycle state and entry count.")]
    async fn cache_keys(&self) -> Result<CallToolResult, McpError> {
        keys_impl(&self.ctx).await
    }

    #[tool(description = "List the request keys held by one cache store (default: the current version).")]
    async fn cache_entries(&self, params: Parameters<CacheEntriesParams>) -> Result<CallToolResult, McpError> {
        entries_impl(&self.ctx, params.0).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{context, shell};

    #[tokio::test]
    async fn test_all_tools_registered() {
        let server = SwCacheServer::new(context(shell()).await);
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "cache_entries",
                "cache_keys",
                "sw_activate",
                "sw_fetch",
                "sw_install",
                "sw_message",
                "sw_notification_click",
                "sw_push",
                "sw_status",
                "sw_sync",
            ]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let server = SwCacheServer::new(context(shell()).await);
        assert_eq!(server.get_info().server_info.name, "swcache-mcp");
    }
}
