//! Detached cache writes.
//!
//! Opportunistic writes never hold up the response they copy. A failed
//! write is logged and reported on the failure channel; it is not retried.

use swcache_core::{CacheDb, Request, Response};
use tokio::sync::mpsc;
use url::Url;

use crate::keep_alive::KeepAlive;

/// A background cache write that did not land.
#[derive(Debug, Clone)]
pub struct WriteFailure {
    pub store: String,
    pub url: Url,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct BackgroundWriter {
    failures: mpsc::UnboundedSender<WriteFailure>,
}

impl BackgroundWriter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WriteFailure>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { failures: tx }, rx)
    }

    /// Write `response` into `store` under `request` on a detached task
    /// registered with `keep_alive`.
    pub fn spawn_put(&self, keep_alive: &KeepAlive, db: CacheDb, store: String, request: Request, response: Response) {
        let failures = self.failures.clone();
        keep_alive.wait_until(async move {
            let result = match db.open_cache(&store).await {
                Ok(cache) => cache.put(&request, &response).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => tracing::debug!(store = %store, url = %request.url, "cache updated"),
                Err(e) => {
                    tracing::warn!(store = %store, url = %request.url, error = %e, "background cache write failed");
                    // Nobody listening is fine; the warning above is the record.
                    let _ = failures.send(WriteFailure { store, url: request.url, error: e.to_string() });
                }
            }
        });
    }
}
