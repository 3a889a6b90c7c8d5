//! Boundary to the hosting runtime.
//!
//! Everything the worker asks of its environment that is not cache or
//! network access goes through [`Host`]: lifecycle promotion, client
//! windows and notifications.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::Error;
use tokio::sync::RwLock;
use url::Url;

/// A page controlled (or controllable) by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NotificationData {
    pub url: String,
}

/// A notification as handed to the host for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

#[async_trait]
pub trait Host: Send + Sync {
    /// Promote this worker without waiting for existing clients to close.
    async fn skip_waiting(&self) -> Result<(), Error>;

    /// Take control of every open client. Returns how many were claimed.
    async fn claim_clients(&self) -> Result<usize, Error>;

    async fn window_clients(&self) -> Result<Vec<WindowClient>, Error>;

    async fn focus(&self, client_id: &str) -> Result<WindowClient, Error>;

    async fn open_window(&self, url: &Url) -> Result<WindowClient, Error>;

    /// Display `notification`; returns the id the host assigned to it.
    async fn show_notification(&self, notification: Notification) -> Result<String, Error>;

    async fn close_notification(&self, id: &str) -> Result<(), Error>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ShownNotification {
    pub id: String,
    pub notification: Notification,
    pub closed: bool,
}

/// Everything a [`LocalHost`] has been asked to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HostRecord {
    pub skip_waiting_calls: u32,
    pub claimed_clients: usize,
    pub windows: Vec<WindowClient>,
    pub notifications: Vec<ShownNotification>,
}

/// In-memory host that records every request.
#[derive(Debug, Default)]
pub struct LocalHost {
    record: RwLock<HostRecord>,
    next_id: AtomicU64,
}

impl LocalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already-open window.
    pub async fn add_window(&self, url: &str) -> WindowClient {
        let client = WindowClient { id: self.next_id("window"), url: url.to_string(), focused: false };
        self.record.write().await.windows.push(client.clone());
        client
    }

    pub async fn record(&self) -> HostRecord {
        self.record.read().await.clone()
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[async_trait]
impl Host for LocalHost {
    async fn skip_waiting(&self) -> Result<(), Error> {
        self.record.write().await.skip_waiting_calls += 1;
        Ok(())
    }

    async fn claim_clients(&self) -> Result<usize, Error> {
        let mut record = self.record.write().await;
        record.claimed_clients = record.windows.len();
        Ok(record.claimed_clients)
    }

    async fn window_clients(&self) -> Result<Vec<WindowClient>, Error> {
        Ok(self.record.read().await.windows.clone())
    }

    async fn focus(&self, client_id: &str) -> Result<WindowClient, Error> {
        let mut record = self.record.write().await;
        if !record.windows.iter().any(|w| w.id == client_id) {
            return Err(Error::Host(format!("no window client {client_id}")));
        }
        for window in record.windows.iter_mut() {
            window.focused = window.id == client_id;
        }
        record
            .windows
            .iter()
            .find(|w| w.id == client_id)
            .cloned()
            .ok_or_else(|| Error::Host(format!("no window client {client_id}")))
    }

    async fn open_window(&self, url: &Url) -> Result<WindowClient, Error> {
        let client = WindowClient { id: self.next_id("window"), url: url.to_string(), focused: true };
        let mut record = self.record.write().await;
        for window in record.windows.iter_mut() {
            window.focused = false;
        }
        record.windows.push(client.clone());
        Ok(client)
    }

    async fn show_notification(&self, notification: Notification) -> Result<String, Error> {
        let id = self.next_id("notification");
        self.record
            .write()
            .await
            .notifications
            .push(ShownNotification { id: id.clone(), notification, closed: false });
        Ok(id)
    }

    async fn close_notification(&self, id: &str) -> Result<(), Error> {
        let mut record = self.record.write().await;
        let shown = record
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| Error::Host(format!("no notification {id}")))?;
        shown.closed = true;
        Ok(())
    }
}
