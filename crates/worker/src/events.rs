//! Event inputs and handler outcomes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{Error, Request, Response};

use crate::host::WindowClient;
use crate::keep_alive::KeepAlive;

/// Lifecycle of the worker itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; the host should discard this worker.
    Redundant,
}

/// Lifecycle of one named store, relative to the current version.
///
/// A deleted store reads as `Absent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StoreState {
    Absent,
    Created,
    Populated,
    Superseded,
}

/// Control messages posted by pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    SkipWaiting,
}

impl ControlMessage {
    /// Decode a posted message. Objects with an unknown `type` are `None`.
    pub fn parse(value: &serde_json::Value) -> Result<Option<Self>, Error> {
        if !value.is_object() {
            return Err(Error::InvalidMessage(format!("expected an object, got {value}")));
        }
        Ok(serde_json::from_value(value.clone()).ok())
    }
}

/// Push payload; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub url: Option<String>,
}

impl PushPayload {
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(data).map_err(|e| Error::InvalidPayload(e.to_string()))
    }
}

/// A click on a shown notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationClick {
    pub notification_id: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct InstallReport {
    pub cache: String,
    pub precached: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ActivateReport {
    pub current: String,
    pub deleted: Vec<String>,
    pub claimed_clients: usize,
}

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
    IndexFallback,
    Offline,
}

#[derive(Debug)]
pub enum FetchOutcome {
    /// Not intercepted; the host sends the request to the network as-is.
    Passthrough(Request),
    Respond { response: Response, source: ResponseSource },
}

/// Result of one fetch event together with its pending work.
#[derive(Debug)]
pub struct FetchEvent {
    pub outcome: FetchOutcome,
    pub keep_alive: KeepAlive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageOutcome {
    SkippedWaiting,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Completed,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PushOutcome {
    Shown { notification_id: String, title: String },
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClickOutcome {
    Focused(WindowClient),
    Opened(WindowClient),
    Dismissed,
}
