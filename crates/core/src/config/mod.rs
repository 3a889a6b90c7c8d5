//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the current cache store. Bumping it retires every other store
    /// on the next activation.
    ///
    /// Set via SWCACHE_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Base URL the worker controls. Relative precache paths and the index
    /// path resolve against it, and its origin decides what counts as
    /// same-origin.
    ///
    /// Set via SWCACHE_SCOPE environment variable.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Paths fetched and stored at install time, in order.
    ///
    /// Both absolute (`/index.html`) and relative (`./index.html`) forms work.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Document served to failed navigations.
    ///
    /// Set via SWCACHE_INDEX_PATH environment variable.
    #[serde(default = "default_index_path")]
    pub index_path: String,

    /// Path to SQLite cache database.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum response body size in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Request headers that take part in the cache key besides method and URL.
    #[serde(default)]
    pub key_headers: Vec<String>,

    /// Extensions eligible for opportunistic caching (e.g. `.css`, `.js`).
    ///
    /// Empty means every successful same-origin GET is cached. The scope
    /// root and the index document are always eligible.
    #[serde(default)]
    pub runtime_cache_extensions: Vec<String>,

    /// Path prefix of network-only API requests (e.g. `/api/`).
    #[serde(default)]
    pub api_prefix: Option<String>,

    /// Body of the plain-text 503 served when offline.
    #[serde(default = "default_offline_message")]
    pub offline_message: String,

    /// Message field of the JSON 503 served to API requests when offline.
    #[serde(default = "default_api_offline_message")]
    pub api_offline_message: String,

    /// Notification title used when a push payload has none.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Notification body used when a push payload has none.
    #[serde(default = "default_notification_body")]
    pub notification_body: String,

    #[serde(default = "default_icon")]
    pub icon: String,

    #[serde(default = "default_badge")]
    pub badge: String,

    /// Vibration pattern in milliseconds.
    #[serde(default = "default_vibrate")]
    pub vibrate: Vec<u32>,

    /// Background sync tag the worker responds to.
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,

    /// Simulated duration of a background sync in milliseconds.
    #[serde(default = "default_sync_delay_ms")]
    pub sync_delay_ms: u64,
}

fn default_cache_version() -> String {
    "swcache-v1".into()
}

fn default_scope() -> String {
    "http://localhost:8080/".into()
}

fn default_precache() -> Vec<String> {
    vec!["./".into(), "./index.html".into()]
}

fn default_index_path() -> String {
    "./index.html".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_offline_message() -> String {
    "Offline - application unavailable".into()
}

fn default_api_offline_message() -> String {
    "Unable to reach the server".into()
}

fn default_app_name() -> String {
    "swcache".into()
}

fn default_notification_body() -> String {
    "New notification".into()
}

fn default_icon() -> String {
    "/icon-192.png".into()
}

fn default_badge() -> String {
    "/icon-72.png".into()
}

fn default_vibrate() -> Vec<u32> {
    vec![100, 50, 100]
}

fn default_sync_tag() -> String {
    "background-sync".into()
}

fn default_sync_delay_ms() -> u64 {
    1_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
            scope: default_scope(),
            precache: default_precache(),
            index_path: default_index_path(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            key_headers: Vec::new(),
            runtime_cache_extensions: Vec::new(),
            api_prefix: None,
            offline_message: default_offline_message(),
            api_offline_message: default_api_offline_message(),
            app_name: default_app_name(),
            notification_body: default_notification_body(),
            icon: default_icon(),
            badge: default_badge(),
            vibrate: default_vibrate(),
            sync_tag: default_sync_tag(),
            sync_delay_ms: default_sync_delay_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn sync_delay(&self) -> Duration {
        Duration::from_millis(self.sync_delay_ms)
    }

    /// The scope as a parsed URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the scope is not an absolute URL.
    pub fn scope_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.scope).map_err(|e| ConfigError::Invalid { field: "scope".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SWCACHE_`
    /// 2. TOML file from `SWCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
