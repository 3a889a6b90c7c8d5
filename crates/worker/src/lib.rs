//! Offline-first caching agent.
//!
//! [`CacheManager`] reacts to the events a service worker sees: install
//! precaches the app shell, activate deletes stale versions, and fetch
//! answers cache-first with a network fallback and offline substitutes.
//! Push, sync and notification-click events are handled through the
//! [`Host`] boundary.

pub mod events;
pub mod host;
pub mod keep_alive;
pub mod manager;
pub mod policy;
pub mod settings;
pub mod writer;

#[cfg(test)]
mod testing;

pub use events::{
    ActivateReport, ClickOutcome, ControlMessage, FetchEvent, FetchOutcome, InstallReport, MessageOutcome,
    NotificationClick, PushOutcome, PushPayload, ResponseSource, StoreState, SyncOutcome, WorkerState,
};
pub use host::{Host, HostRecord, LocalHost, Notification, NotificationAction, NotificationData, WindowClient};
pub use keep_alive::KeepAlive;
pub use manager::CacheManager;
pub use policy::RuntimeCacheRule;
pub use settings::{NotificationDefaults, WorkerSettings};
pub use swcache_client::Network;
pub use writer::{BackgroundWriter, WriteFailure};
