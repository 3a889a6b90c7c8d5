//! sw_push tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_worker::PushOutcome;

use super::{WorkerContext, json_result};

/// Parameters for the sw_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Push message data as text, normally JSON `{title?, body?, url?}`.
    /// Omit to deliver a push without data.
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwPushOutput {
    pub outcome: PushOutcome,
}

/// Implementation of the sw_push tool.
pub async fn push_impl(ctx: &WorkerContext, params: SwPushParams) -> Result<CallToolResult, McpError> {
    let outcome = ctx.manager.push(params.data.as_deref().map(str::as_bytes)).await?;
    json_result(&SwPushOutput { outcome })
}
