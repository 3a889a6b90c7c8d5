//! Resolved worker settings.
//!
//! `AppConfig` carries paths as written by the operator; the worker needs
//! them resolved against the scope once, up front, so a bad manifest fails
//! at startup instead of on first install.

use std::time::Duration;

use swcache_client::resolve;
use swcache_core::{AppConfig, Error};
use url::Url;

/// Fixed notification fields and the defaults used for absent payload fields.
#[derive(Debug, Clone)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub cache_version: String,
    pub scope: Url,
    pub precache: Vec<Url>,
    pub index_url: Url,
    pub runtime_cache_extensions: Vec<String>,
    pub api_prefix: Option<String>,
    pub offline_message: String,
    pub api_offline_message: String,
    pub notification: NotificationDefaults,
    pub sync_tag: String,
    pub sync_delay: Duration,
}

impl WorkerSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let scope = config.scope_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let resolve_path =
            |path: &str| resolve(&scope, path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")));

        // Paths that resolve to the same URL share one cache entry.
        let mut precache: Vec<Url> = Vec::with_capacity(config.precache.len());
        for path in &config.precache {
            let url = resolve_path(path)?;
            if !precache.contains(&url) {
                precache.push(url);
            }
        }
        let index_url = resolve_path(&config.index_path)?;

        Ok(Self {
            cache_version: config.cache_version.clone(),
            precache,
            index_url,
            runtime_cache_extensions: config.runtime_cache_extensions.clone(),
            api_prefix: config.api_prefix.clone(),
            offline_message: config.offline_message.clone(),
            api_offline_message: config.api_offline_message.clone(),
            notification: NotificationDefaults {
                title: config.app_name.clone(),
                body: config.notification_body.clone(),
                icon: config.icon.clone(),
                badge: config.badge.clone(),
                vibrate: config.vibrate.clone(),
            },
            sync_tag: config.sync_tag.clone(),
            sync_delay: config.sync_delay(),
            scope,
        })
    }
}
