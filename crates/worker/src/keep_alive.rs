//! Keep-alive registration for event handlers.
//!
//! An event is complete only when every task registered through
//! [`KeepAlive::wait_until`] has settled. Hosts call [`KeepAlive::settle`]
//! before treating the event as done (for example before shutting down).

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

/// Pending-work token shared by one event's handler and its detached tasks.
#[derive(Debug, Clone, Default)]
pub struct KeepAlive {
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl KeepAlive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` and keep the event alive until it finishes.
    pub fn wait_until<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        self.lock().push(handle);
    }

    /// Number of tasks registered and not yet collected by [`settle`](Self::settle).
    pub fn registered(&self) -> usize {
        self.lock().len()
    }

    /// Number of registered tasks that have not finished yet.
    pub fn pending(&self) -> usize {
        self.lock().iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every registered task, including ones registered meanwhile.
    pub async fn settle(&self) {
        loop {
            let batch = std::mem::take(&mut *self.lock());
            if batch.is_empty() {
                break;
            }
            for handle in batch {
                if let Err(e) = handle.await
                    && e.is_panic()
                {
                    tracing::error!("keep-alive task panicked: {e}");
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
