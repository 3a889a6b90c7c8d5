//! cache_keys tool implementation.
//!
//! Lists every cache store with its lifecycle state and entry count.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_worker::StoreState;

use crate::tools::{WorkerContext, json_result};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    pub state: StoreState,
    pub entries: u64,
    pub created_at: String,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    /// Name of the store the worker reads from.
    pub current: String,
    pub stores: Vec<StoreSummary>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(ctx: &WorkerContext) -> Result<CallToolResult, McpError> {
    let infos = ctx.manager.db().store_infos().await?;

    let mut stores = Vec::with_capacity(infos.len());
    for info in infos {
        let state = ctx.manager.store_state(&info.name).await?;
        stores.push(StoreSummary { name: info.name, state, entries: info.entries, created_at: info.created_at });
    }

    json_result(&CacheKeysOutput { current: ctx.manager.settings().cache_version.clone(), stores })
}
