//! sw_status tool implementation.
//!
//! Reports the worker lifecycle state, what the host has been asked to do,
//! and any background cache writes that failed.

use chrono::Utc;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_worker::{HostRecord, WorkerState, WriteFailure};

use super::{WorkerContext, json_result};

/// A background cache write that failed, as first observed by the harness.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FailedWrite {
    pub store: String,
    pub url: String,
    pub error: String,
    pub observed_at: String,
}

impl From<WriteFailure> for FailedWrite {
    fn from(failure: WriteFailure) -> Self {
        Self {
            store: failure.store,
            url: failure.url.to_string(),
            error: failure.error,
            observed_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Output from the sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwStatusOutput {
    pub state: WorkerState,
    pub cache_version: String,
    pub scope: String,
    pub host: HostRecord,
    pub failed_writes: Vec<FailedWrite>,
}

/// Implementation of the sw_status tool.
pub async fn status_impl(ctx: &WorkerContext) -> Result<CallToolResult, McpError> {
    let settings = ctx.manager.settings();
    let output = SwStatusOutput {
        state: ctx.manager.state(),
        cache_version: settings.cache_version.clone(),
        scope: settings.scope.to_string(),
        host: ctx.host.record().await,
        failed_writes: ctx.failed_writes(),
    };
    json_result(&output)
}
