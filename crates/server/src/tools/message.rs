//! sw_message tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_worker::MessageOutcome;

use super::{WorkerContext, json_result};

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message posted to the worker, e.g. `{"type": "SKIP_WAITING"}`.
    pub message: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwMessageOutput {
    pub outcome: MessageOutcome,
}

/// Implementation of the sw_message tool.
pub async fn message_impl(ctx: &WorkerContext, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let outcome = ctx.manager.message(&params.message).await?;
    json_result(&SwMessageOutput { outcome })
}
