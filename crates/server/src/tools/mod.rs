//! MCP tool implementations.
//!
//! Each tool drives one worker event (or inspects the store) and returns its
//! outcome as pretty-printed JSON text.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use swcache_worker::{CacheManager, LocalHost, Network, WriteFailure};
use tokio::sync::mpsc;

use crate::error::ToolError;

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod notification;
pub mod push;
pub mod status;
pub mod sync;

use status::FailedWrite;

/// Everything the tools act on.
pub struct WorkerContext {
    pub manager: CacheManager,
    pub host: Arc<LocalHost>,
    /// Used directly for requests the worker passes through.
    pub network: Arc<dyn Network>,
    failures: Mutex<FailureLog>,
}

/// Most recent background write failures kept for sw_status.
pub const MAX_FAILED_WRITES: usize = 100;

struct FailureLog {
    rx: Option<mpsc::UnboundedReceiver<WriteFailure>>,
    seen: VecDeque<FailedWrite>,
}

impl FailureLog {
    fn new(rx: Option<mpsc::UnboundedReceiver<WriteFailure>>) -> Self {
        Self { rx, seen: VecDeque::with_capacity(MAX_FAILED_WRITES) }
    }

    /// Pull everything reported since the last call; the oldest entries go first.
    fn drain(&mut self) {
        let Some(rx) = self.rx.as_mut() else { return };
        while let Ok(failure) = rx.try_recv() {
            if self.seen.len() == MAX_FAILED_WRITES {
                self.seen.pop_front();
            }
            self.seen.push_back(FailedWrite::from(failure));
        }
    }
}

impl WorkerContext {
    pub fn new(manager: CacheManager, host: Arc<LocalHost>, network: Arc<dyn Network>) -> Self {
        let rx = manager.write_failures();
        Self { manager, host, network, failures: Mutex::new(FailureLog::new(rx)) }
    }

    /// The most recent background write failures, oldest first.
    pub fn failed_writes(&self) -> Vec<FailedWrite> {
        let mut log = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        log.drain();
        log.seen.iter().cloned().collect()
    }
}

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::Serialize(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
