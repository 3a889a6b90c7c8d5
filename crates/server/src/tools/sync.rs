//! sw_sync tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_worker::SyncOutcome;

use super::{WorkerContext, json_result};

/// Parameters for the sw_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncParams {
    /// Sync registration tag.
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwSyncOutput {
    pub tag: String,
    pub outcome: SyncOutcome,
}

/// Implementation of the sw_sync tool.
pub async fn sync_impl(ctx: &WorkerContext, params: SwSyncParams) -> Result<CallToolResult, McpError> {
    let outcome = ctx.manager.sync(&params.tag).await;
    json_result(&SwSyncOutput { tag: params.tag, outcome })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{config, context_with, output, shell};

    #[tokio::test]
    async fn test_sync_tags() {
        let mut cfg = config();
        cfg.sync_delay_ms = 1;
        let ctx = context_with(shell(), &cfg).await;

        let out: serde_json::Value =
            output(&sync_impl(&ctx, SwSyncParams { tag: "background-sync".into() }).await.unwrap());
        assert_eq!(out["outcome"], "completed");

        let out: serde_json::Value = output(&sync_impl(&ctx, SwSyncParams { tag: "other".into() }).await.unwrap());
        assert_eq!(out["outcome"], "ignored");
    }
}
