//! cache_entries tool implementation.
//!
//! Lists the request keys held by one store.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CachedRequest, Error};

use crate::tools::{WorkerContext, json_result};

/// Parameters for the cache_entries tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntriesParams {
    /// Store name (default: the current version).
    #[serde(default)]
    pub store: Option<String>,
}

/// Output from the cache_entries tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntriesOutput {
    pub store: String,
    pub entries: Vec<CachedRequest>,
}

/// Implementation of the cache_entries tool.
pub async fn entries_impl(ctx: &WorkerContext, params: CacheEntriesParams) -> Result<CallToolResult, McpError> {
    let db = ctx.manager.db();
    let store = params.store.unwrap_or_else(|| ctx.manager.settings().cache_version.clone());

    if !db.has_cache(&store).await? {
        return Err(Error::CacheMiss(format!("no cache store named {store}")).into());
    }
    let entries = db.cache(&store).keys().await?;

    json_result(&CacheEntriesOutput { store, entries })
}
