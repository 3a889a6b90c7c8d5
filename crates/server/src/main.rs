//! swcache-mcp server entry point.
//!
//! Boots the caching agent against its SQLite store and exposes its events
//! as MCP tools on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{FetchClient, FetchConfig};
use swcache_core::{AppConfig, CacheDb};
use swcache_worker::{CacheManager, LocalHost, Network, WorkerSettings};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        cache_version = %config.cache_version,
        scope = %config.scope,
        db = %config.db_path.display(),
        "Starting swcache-mcp server on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?.with_key_headers(&config.key_headers);
    let network: Arc<dyn Network> = Arc::new(FetchClient::new(FetchConfig::from_app_config(&config)?)?);
    let host = Arc::new(LocalHost::new());
    let settings = WorkerSettings::from_config(&config)?;
    let manager = CacheManager::new(db, network.clone(), host.clone(), settings);

    let handler = handler::SwCacheServer::new(tools::WorkerContext::new(manager, host, network));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
