//! sw_install and sw_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_worker::WorkerState;

use super::{WorkerContext, json_result};

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallOutput {
    /// Store the precache list was committed to.
    pub cache: String,
    /// Number of entries committed.
    pub precached: usize,
    pub state: WorkerState,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivateOutput {
    pub current: String,
    /// Stale stores that were deleted.
    pub deleted: Vec<String>,
    pub claimed_clients: usize,
    pub state: WorkerState,
}

/// Implementation of the sw_install tool.
pub async fn install_impl(ctx: &WorkerContext) -> Result<CallToolResult, McpError> {
    let report = ctx.manager.install().await?;
    json_result(&InstallOutput { cache: report.cache, precached: report.precached, state: ctx.manager.state() })
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(ctx: &WorkerContext) -> Result<CallToolResult, McpError> {
    let report = ctx.manager.activate().await?;
    json_result(&ActivateOutput {
        current: report.current,
        deleted: report.deleted,
        claimed_clients: report.claimed_clients,
        state: ctx.manager.state(),
    })
}
