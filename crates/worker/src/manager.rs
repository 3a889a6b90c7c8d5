//! The cache manager: lifecycle events and request interception.

use std::sync::{Arc, Mutex, PoisonError};

use swcache_core::{CacheDb, Error, Method, Request, Response};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use crate::Network;
use crate::events::{
    ActivateReport, ClickOutcome, ControlMessage, FetchEvent, FetchOutcome, InstallReport, MessageOutcome,
    NotificationClick, PushOutcome, PushPayload, ResponseSource, StoreState, SyncOutcome, WorkerState,
};
use crate::host::{Host, Notification, NotificationAction, NotificationData};
use crate::keep_alive::KeepAlive;
use crate::policy::RuntimeCacheRule;
use crate::settings::WorkerSettings;
use crate::writer::{BackgroundWriter, WriteFailure};

/// Offline-first cache manager for one worker version.
///
/// All state lives in the injected [`CacheDb`]; the manager itself only
/// tracks its own lifecycle.
pub struct CacheManager {
    db: CacheDb,
    network: Arc<dyn Network>,
    host: Arc<dyn Host>,
    settings: WorkerSettings,
    rule: RuntimeCacheRule,
    writer: BackgroundWriter,
    write_failures: Mutex<Option<mpsc::UnboundedReceiver<WriteFailure>>>,
    state: watch::Sender<WorkerState>,
}

impl CacheManager {
    pub fn new(db: CacheDb, network: Arc<dyn Network>, host: Arc<dyn Host>, settings: WorkerSettings) -> Self {
        let rule = RuntimeCacheRule::new(
            &settings.scope,
            &settings.index_url,
            &settings.runtime_cache_extensions,
            settings.api_prefix.as_deref(),
        );
        let (writer, failures) = BackgroundWriter::new();
        let (state, _) = watch::channel(WorkerState::Parsed);

        Self { db, network, host, settings, rule, writer, write_failures: Mutex::new(Some(failures)), state }
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    /// Receiver for failed background writes. Available once.
    pub fn write_failures(&self) -> Option<mpsc::UnboundedReceiver<WriteFailure>> {
        self.write_failures.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// Populate the current store with the precache list.
    ///
    /// Either every listed resource is committed or none is. On failure the
    /// worker becomes [`WorkerState::Redundant`].
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.set_state(WorkerState::Installing);

        let precached = match self.precache().await {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(cache = %self.settings.cache_version, error = %e, "install failed");
                self.set_state(WorkerState::Redundant);
                return Err(match e {
                    Error::InstallFailed(_) => e,
                    other => Error::InstallFailed(other.to_string()),
                });
            }
        };

        tracing::info!(cache = %self.settings.cache_version, precached, "precache committed");
        self.set_state(WorkerState::Installed);
        // The precache is committed either way; the worker stays Installed and waits.
        if let Err(e) = self.host.skip_waiting().await {
            tracing::error!(cache = %self.settings.cache_version, error = %e, "skip waiting failed after install");
            return Err(e);
        }

        Ok(InstallReport { cache: self.settings.cache_version.clone(), precached })
    }

    async fn precache(&self) -> Result<usize, Error> {
        let cache = self.db.open_cache(&self.settings.cache_version).await?;

        let mut set = JoinSet::new();
        for (index, url) in self.settings.precache.iter().enumerate() {
            let network = Arc::clone(&self.network);
            let request = Request::get(url.clone());
            set.spawn(async move {
                let result = network.fetch(&request).await;
                (index, request, result)
            });
        }

        let mut fetched = Vec::with_capacity(self.settings.precache.len());
        while let Some(joined) = set.join_next().await {
            let (index, request, result) =
                joined.map_err(|e| Error::InstallFailed(format!("precache task failed: {e}")))?;
            let response = result.map_err(|e| Error::InstallFailed(format!("{}: {e}", request.url)))?;
            if !response.is_ok() {
                return Err(Error::InstallFailed(format!("{} returned {}", request.url, response.status)));
            }
            fetched.push((index, request, response));
        }

        fetched.sort_by_key(|(index, _, _)| *index);
        let pairs: Vec<(Request, Response)> = fetched.into_iter().map(|(_, req, resp)| (req, resp)).collect();
        cache.put_all(&pairs).await
    }

    /// Delete every store but the current one and claim open clients.
    ///
    /// Only an installed worker may activate. A redundant one never touches
    /// the stores, so the previous version keeps serving.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let state = self.state();
        if state != WorkerState::Installed {
            tracing::warn!(cache = %self.settings.cache_version, ?state, "activate rejected");
            return Err(Error::InvalidState(format!("cannot activate a worker in state {state:?}")));
        }
        self.set_state(WorkerState::Activating);
        let current = &self.settings.cache_version;

        let mut deleted = Vec::new();
        for name in self.db.cache_names().await? {
            if &name == current {
                continue;
            }
            if self.db.delete_cache(&name).await? {
                tracing::info!(cache = %name, "deleted stale cache");
                deleted.push(name);
            }
        }

        let claimed_clients = self.host.claim_clients().await?;
        self.set_state(WorkerState::Activated);

        Ok(ActivateReport { current: current.clone(), deleted, claimed_clients })
    }

    /// Answer an intercepted request.
    ///
    /// Never fails: every failure path ends in a fallback response. Cache
    /// writes triggered by the event are registered on the returned
    /// keep-alive.
    pub async fn handle_fetch(&self, request: Request) -> FetchEvent {
        let keep_alive = KeepAlive::new();
        let outcome = self.intercept(request, &keep_alive).await;
        FetchEvent { outcome, keep_alive }
    }

    async fn intercept(&self, request: Request, keep_alive: &KeepAlive) -> FetchOutcome {
        if request.method != Method::Get {
            return FetchOutcome::Passthrough(request);
        }

        if self.rule.is_api(&request.url) {
            return self.network_only(&request).await;
        }

        if let Some(response) = self.lookup(&request).await {
            tracing::debug!(url = %request.url, "cache hit");
            return FetchOutcome::Respond { response, source: ResponseSource::Cache };
        }

        match self.network.fetch(&request).await {
            Ok(response) => {
                if RuntimeCacheRule::is_cacheable_response(&response) && self.rule.allows(&request.url) {
                    self.writer.spawn_put(
                        keep_alive,
                        self.db.clone(),
                        self.settings.cache_version.clone(),
                        request,
                        response.clone(),
                    );
                }
                FetchOutcome::Respond { response, source: ResponseSource::Network }
            }
            Err(e) => {
                tracing::error!(url = %request.url, error = %e, "network fetch failed");
                self.offline_fallback(&request).await
            }
        }
    }

    async fn network_only(&self, request: &Request) -> FetchOutcome {
        match self.network.fetch(request).await {
            Ok(response) => FetchOutcome::Respond { response, source: ResponseSource::Network },
            Err(e) => {
                tracing::error!(url = %request.url, error = %e, "api request failed");
                FetchOutcome::Respond {
                    response: Response::offline_json(&self.settings.api_offline_message),
                    source: ResponseSource::Offline,
                }
            }
        }
    }

    async fn offline_fallback(&self, request: &Request) -> FetchOutcome {
        if request.is_navigation()
            && let Some(index) = self.lookup(&Request::get(self.settings.index_url.clone())).await
        {
            return FetchOutcome::Respond { response: index, source: ResponseSource::IndexFallback };
        }
        FetchOutcome::Respond {
            response: Response::offline_text(&self.settings.offline_message),
            source: ResponseSource::Offline,
        }
    }

    /// Current-store lookup; read errors count as a miss.
    async fn lookup(&self, request: &Request) -> Option<Response> {
        match self.db.cache(&self.settings.cache_version).match_request(request).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache read failed");
                None
            }
        }
    }

    pub async fn message(&self, message: &serde_json::Value) -> Result<MessageOutcome, Error> {
        match ControlMessage::parse(message)? {
            Some(ControlMessage::SkipWaiting) => {
                self.host.skip_waiting().await?;
                tracing::info!("skip waiting requested by client");
                Ok(MessageOutcome::SkippedWaiting)
            }
            None => {
                tracing::debug!(%message, "ignored message");
                Ok(MessageOutcome::Ignored)
            }
        }
    }

    pub async fn sync(&self, tag: &str) -> SyncOutcome {
        if tag != self.settings.sync_tag {
            tracing::debug!(tag, "ignored sync tag");
            return SyncOutcome::Ignored;
        }
        tracing::info!(tag, "background sync started");
        tokio::time::sleep(self.settings.sync_delay).await;
        tracing::info!(tag, "background sync completed");
        SyncOutcome::Completed
    }

    /// Show a notification for a push message. No data means nothing to show.
    pub async fn push(&self, data: Option<&[u8]>) -> Result<PushOutcome, Error> {
        let Some(data) = data.filter(|d| !d.is_empty()) else {
            return Ok(PushOutcome::Ignored);
        };
        let payload = PushPayload::parse(data)?;
        let defaults = &self.settings.notification;

        let notification = Notification {
            title: payload.title.filter(|t| !t.is_empty()).unwrap_or_else(|| defaults.title.clone()),
            body: payload.body.filter(|b| !b.is_empty()).unwrap_or_else(|| defaults.body.clone()),
            icon: defaults.icon.clone(),
            badge: defaults.badge.clone(),
            vibrate: defaults.vibrate.clone(),
            data: NotificationData {
                url: payload.url.filter(|u| !u.is_empty()).unwrap_or_else(|| self.settings.scope.to_string()),
            },
            actions: vec![
                NotificationAction { action: "view".into(), title: "View".into() },
                NotificationAction { action: "close".into(), title: "Close".into() },
            ],
        };
        let title = notification.title.clone();
        let notification_id = self.host.show_notification(notification).await?;
        tracing::debug!(id = %notification_id, "notification shown");

        Ok(PushOutcome::Shown { notification_id, title })
    }

    pub async fn notification_click(&self, click: NotificationClick) -> Result<ClickOutcome, Error> {
        if let Some(id) = &click.notification_id {
            self.host.close_notification(id).await?;
        }
        if click.action.as_deref() != Some("view") {
            return Ok(ClickOutcome::Dismissed);
        }

        let root = self.settings.scope.as_str();
        let windows = self.host.window_clients().await?;
        if let Some(window) = windows.iter().find(|w| w.url == root) {
            return Ok(ClickOutcome::Focused(self.host.focus(&window.id).await?));
        }
        Ok(ClickOutcome::Opened(self.host.open_window(&self.settings.scope).await?))
    }

    pub async fn store_state(&self, name: &str) -> Result<StoreState, Error> {
        if !self.db.has_cache(name).await? {
            return Ok(StoreState::Absent);
        }
        if name != self.settings.cache_version {
            return Ok(StoreState::Superseded);
        }
        if self.db.cache(name).is_empty().await? { Ok(StoreState::Created) } else { Ok(StoreState::Populated) }
    }

    fn set_state(&self, next: WorkerState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            tracing::info!(from = ?prev, to = ?next, "worker state changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RefusingHost, ScriptedNetwork, config, harness, harness_on, url};
    use std::time::{Duration, Instant};
    use swcache_core::{Destination, RequestMode, ResponseType};
    use url::Url;

    fn respond(event: FetchEvent) -> (Response, ResponseSource) {
        match event.outcome {
            FetchOutcome::Respond { response, source } => (response, source),
            FetchOutcome::Passthrough(req) => panic!("unexpected passthrough of {}", req.url),
        }
    }

    fn script_shell(network: &ScriptedNetwork) {
        network.respond(url("./").as_str(), 200, "<html>root</html>");
        network.respond(url("./index.html").as_str(), 200, "<html>index</html>");
    }

    #[tokio::test]
    async fn test_install_precaches_and_skips_waiting() {
        let h = harness(&config("v1")).await;
        script_shell(&h.network);

        let report = h.manager.install().await.unwrap();

        assert_eq!(report, InstallReport { cache: "v1".into(), precached: 2 });
        assert_eq!(h.manager.state(), WorkerState::Installed);
        assert_eq!(h.db.cache("v1").len().await.unwrap(), 2);
        assert_eq!(h.host.record().await.skip_waiting_calls, 1);
        assert_eq!(h.manager.store_state("v1").await.unwrap(), StoreState::Populated);
    }

    #[tokio::test]
    async fn test_install_reports_stored_count_for_aliased_paths() {
        let mut cfg = config("v1");
        cfg.precache = vec!["/".into(), "./".into(), "./index.html".into()];
        let h = harness(&cfg).await;
        script_shell(&h.network);

        let report = h.manager.install().await.unwrap();

        assert_eq!(report.precached, 2);
        assert_eq!(h.db.cache("v1").len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_install_with_missing_index_commits_nothing() {
        let h = harness(&config("v1")).await;
        h.network.respond(url("./").as_str(), 200, "root");
        h.network.respond(url("./index.html").as_str(), 404, "not found");

        let err = h.manager.install().await.unwrap_err();

        assert!(matches!(err, Error::InstallFailed(_)));
        assert!(err.to_string().contains("404"));
        assert_eq!(h.manager.state(), WorkerState::Redundant);
        assert_eq!(h.db.cache("v1").len().await.unwrap(), 0);
        assert_eq!(h.host.record().await.skip_waiting_calls, 0);
    }

    #[tokio::test]
    async fn test_install_network_failure() {
        let h = harness(&config("v1")).await;
        h.network.respond(url("./").as_str(), 200, "root");
        h.network.fail(url("./index.html").as_str());

        let err = h.manager.install().await.unwrap_err();

        assert!(err.to_string().starts_with("INSTALL_FAILED"));
        assert_eq!(h.manager.store_state("v1").await.unwrap(), StoreState::Created);
    }

    #[tokio::test]
    async fn test_install_with_empty_manifest() {
        let mut cfg = config("v1");
        cfg.precache.clear();
        let h = harness(&cfg).await;

        let report = h.manager.install().await.unwrap();
        assert_eq!(report.precached, 0);
        assert!(h.db.has_cache("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_activate_deletes_stale_stores() {
        let h = harness(&config("v3")).await;
        for name in ["v1", "v2", "v3", "other-app"] {
            h.db.open_cache(name).await.unwrap();
        }
        h.host.add_window("https://app.test/").await;
        script_shell(&h.network);
        h.manager.install().await.unwrap();

        let report = h.manager.activate().await.unwrap();

        assert_eq!(report.deleted, vec!["v1", "v2", "other-app"]);
        assert_eq!(report.claimed_clients, 1);
        assert_eq!(h.db.cache_names().await.unwrap(), vec!["v3"]);
        assert_eq!(h.manager.state(), WorkerState::Activated);
        assert_eq!(h.manager.store_state("v1").await.unwrap(), StoreState::Absent);
    }

    #[tokio::test]
    async fn test_successive_versions_leave_only_latest() {
        let old = harness(&config("v1.2")).await;
        script_shell(&old.network);
        old.manager.install().await.unwrap();
        old.manager.activate().await.unwrap();

        let new = harness_on(old.db.clone(), &config("v1.3"));
        script_shell(&new.network);
        new.manager.install().await.unwrap();

        assert_eq!(new.manager.store_state("v1.2").await.unwrap(), StoreState::Superseded);

        let report = new.manager.activate().await.unwrap();
        assert_eq!(report.deleted, vec!["v1.2"]);
        assert_eq!(new.db.cache_names().await.unwrap(), vec!["v1.3"]);
        assert_eq!(new.db.cache("v1.3").len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let h = harness(&config("v2")).await;
        h.db.open_cache("v1").await.unwrap();

        let err = h.manager.activate().await.unwrap_err();

        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(h.manager.state(), WorkerState::Parsed);
        assert_eq!(h.db.cache_names().await.unwrap(), vec!["v1"]);
    }

    #[tokio::test]
    async fn test_activate_twice_rejected() {
        let h = harness(&config("v1")).await;
        script_shell(&h.network);
        h.manager.install().await.unwrap();
        h.manager.activate().await.unwrap();

        let err = h.manager.activate().await.unwrap_err();

        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(h.manager.state(), WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_failed_upgrade_leaves_previous_version_serving() {
        let old = harness(&config("v1")).await;
        script_shell(&old.network);
        old.manager.install().await.unwrap();
        old.manager.activate().await.unwrap();

        let new = harness_on(old.db.clone(), &config("v2"));
        new.network.respond(url("./").as_str(), 200, "root");
        new.network.respond(url("./index.html").as_str(), 404, "not found");
        assert!(new.manager.install().await.is_err());

        let err = new.manager.activate().await.unwrap_err();

        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(new.manager.state(), WorkerState::Redundant);
        assert_eq!(new.db.cache_names().await.unwrap(), vec!["v1", "v2"]);
        assert_eq!(new.db.cache("v1").len().await.unwrap(), 2);

        old.network.go_offline();
        let (response, source) = respond(old.manager.handle_fetch(Request::navigate(url("./records/7"))).await);
        assert_eq!(source, ResponseSource::IndexFallback);
        assert_eq!(response.body.as_ref(), b"<html>index</html>");
    }

    #[tokio::test]
    async fn test_refused_skip_waiting_keeps_precache() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = Arc::new(ScriptedNetwork::new());
        script_shell(&network);
        let settings = WorkerSettings::from_config(&config("v1")).unwrap();
        let manager = CacheManager::new(db.clone(), network, Arc::new(RefusingHost::default()), settings);

        let err = manager.install().await.unwrap_err();

        assert!(matches!(err, Error::Host(_)));
        assert_eq!(manager.state(), WorkerState::Installed);
        assert_eq!(db.cache("v1").len().await.unwrap(), 2);
        assert!(manager.activate().await.is_ok());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let h = harness(&config("v1")).await;
        let request = Request::get(url("./styles.css"));
        let stored = Response::new(200, "body { color: red }").with_header("Content-Type", "text/css");
        h.db.open_cache("v1").await.unwrap().put(&request, &stored).await.unwrap();

        let (response, source) = respond(h.manager.handle_fetch(request).await);

        assert_eq!(source, ResponseSource::Cache);
        assert_eq!(response.body.as_ref(), b"body { color: red }");
        assert_eq!(response.content_type(), Some("text/css"));
        assert!(h.network.calls().is_empty());
    }

    #[tokio::test]
    async fn test_hit_ignores_other_stores() {
        let h = harness(&config("v2")).await;
        let request = Request::get(url("./app.js"));
        h.db.open_cache("v1").await.unwrap().put(&request, &Response::new(200, "old")).await.unwrap();
        h.network.respond(request.url.as_str(), 200, "new");

        let (response, source) = respond(h.manager.handle_fetch(request).await);
        assert_eq!(source, ResponseSource::Network);
        assert_eq!(response.body.as_ref(), b"new");
    }

    #[tokio::test]
    async fn test_miss_returns_network_response_and_stores_copy() {
        let h = harness(&config("v1")).await;
        let request = Request::get(url("./app.js"));
        h.network.respond(request.url.as_str(), 200, "console.log(1)");

        let event = h.manager.handle_fetch(request.clone()).await;
        let keep_alive = event.keep_alive.clone();
        let (response, source) = respond(event);
        keep_alive.settle().await;

        assert_eq!(source, ResponseSource::Network);
        assert_eq!(response.body.as_ref(), b"console.log(1)");
        let stored = h.db.cache("v1").match_request(&request).await.unwrap().unwrap();
        assert_eq!(stored, response);
    }

    #[tokio::test]
    async fn test_uncacheable_responses_not_stored() {
        let h = harness(&config("v1")).await;
        let missing = Request::get(url("./missing.js"));
        let cdn = Request::get(Url::parse("https://cdn.test/lib.js").unwrap());
        let opaque = Request::get(url("./proxied.js"));
        h.network.respond(missing.url.as_str(), 404, "nope");
        h.network
            .respond_with(cdn.url.as_str(), Response::new(200, "lib").with_type(ResponseType::Cors));
        h.network
            .respond_with(opaque.url.as_str(), Response::new(200, "x").with_type(ResponseType::Opaque));

        for request in [missing, cdn, opaque] {
            let event = h.manager.handle_fetch(request).await;
            event.keep_alive.settle().await;
        }

        assert!(h.db.cache("v1").is_empty().await.unwrap());
        assert!(!h.db.has_cache("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_extension_filter_limits_runtime_writes() {
        let mut cfg = config("v1");
        cfg.runtime_cache_extensions = vec![".css".into(), ".js".into()];
        let h = harness(&cfg).await;
        h.network.respond(url("./app.js").as_str(), 200, "js");
        h.network.respond(url("./data.json").as_str(), 200, "{}");

        for path in ["./app.js", "./data.json"] {
            let event = h.manager.handle_fetch(Request::get(url(path))).await;
            event.keep_alive.settle().await;
        }

        let keys = h.db.cache("v1").keys().await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].url, "https://app.test/app.js");
    }

    #[tokio::test]
    async fn test_non_get_passes_through() {
        let h = harness(&config("v1")).await;
        let request = Request::get(url("./api/records")).with_method(Method::Post).with_body("{}");

        let event = h.manager.handle_fetch(request.clone()).await;

        match event.outcome {
            FetchOutcome::Passthrough(passed) => assert_eq!(passed, request),
            other => panic!("expected passthrough, got {other:?}"),
        }
        assert_eq!(event.keep_alive.pending(), 0);
        assert!(h.network.calls().is_empty());
        assert!(!h.db.has_cache("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_offline_navigation_gets_cached_index() {
        let h = harness(&config("v1")).await;
        script_shell(&h.network);
        h.manager.install().await.unwrap();
        h.network.go_offline();

        let request = Request::navigate(url("./records/42"));
        let (response, source) = respond(h.manager.handle_fetch(request).await);

        assert_eq!(source, ResponseSource::IndexFallback);
        assert_eq!(response.body.as_ref(), b"<html>index</html>");
    }

    #[tokio::test]
    async fn test_document_destination_counts_as_navigation() {
        let h = harness(&config("v1")).await;
        script_shell(&h.network);
        h.manager.install().await.unwrap();
        h.network.go_offline();

        let request = Request::get(url("./about")).with_destination(Destination::Document).with_mode(RequestMode::Cors);
        let (_, source) = respond(h.manager.handle_fetch(request).await);
        assert_eq!(source, ResponseSource::IndexFallback);
    }

    #[tokio::test]
    async fn test_offline_navigation_without_index_gets_503() {
        let h = harness(&config("v1")).await;

        let (response, source) = respond(h.manager.handle_fetch(Request::navigate(url("./"))).await);

        assert_eq!(source, ResponseSource::Offline);
        assert_eq!(response.status, 503);
        assert_eq!(response.content_type(), Some("text/plain"));
        assert_eq!(response.body.as_ref(), b"Offline - application unavailable");
    }

    #[tokio::test]
    async fn test_offline_subresource_gets_503() {
        let h = harness(&config("v1")).await;
        script_shell(&h.network);
        h.manager.install().await.unwrap();
        h.network.go_offline();

        let request = Request::get(url("./logo.png")).with_destination(Destination::Image);
        let (response, source) = respond(h.manager.handle_fetch(request).await);

        assert_eq!(source, ResponseSource::Offline);
        assert_eq!(response.status, 503);
        assert_eq!(response.status_text, "Service Unavailable");
    }

    #[tokio::test]
    async fn test_api_requests_are_network_only() {
        let mut cfg = config("v1");
        cfg.api_prefix = Some("/api/".into());
        let h = harness(&cfg).await;
        let request = Request::get(url("./api/records"));
        h.network.respond(request.url.as_str(), 200, "[]");

        let event = h.manager.handle_fetch(request.clone()).await;
        event.keep_alive.settle().await;
        assert!(!h.db.has_cache("v1").await.unwrap());

        h.network.go_offline();
        let (response, source) = respond(h.manager.handle_fetch(request).await);
        assert_eq!(source, ResponseSource::Offline);
        assert_eq!(response.content_type(), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["error"], "Offline");
        assert_eq!(body["message"], "Unable to reach the server");
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_store() {
        let h = harness(&config("v1")).await;
        h.network.respond(url("./a.js").as_str(), 200, "a");
        h.network.respond(url("./b.js").as_str(), 200, "b");

        let (a, b) = tokio::join!(
            h.manager.handle_fetch(Request::get(url("./a.js"))),
            h.manager.handle_fetch(Request::get(url("./b.js"))),
        );
        a.keep_alive.settle().await;
        b.keep_alive.settle().await;

        assert_eq!(h.db.cache("v1").len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_write_failure_reported_and_response_unaffected() {
        let h = harness(&config("v1")).await;
        let mut failures = h.manager.write_failures().unwrap();
        assert!(h.manager.write_failures().is_none());
        h.network.respond(url("./app.js").as_str(), 200, "js");
        h.db.clone().close().await.unwrap();

        let event = h.manager.handle_fetch(Request::get(url("./app.js"))).await;
        let keep_alive = event.keep_alive.clone();
        let (response, source) = respond(event);
        keep_alive.settle().await;

        assert_eq!((response.status, source), (200, ResponseSource::Network));
        let failure = failures.try_recv().unwrap();
        assert_eq!(failure.url, url("./app.js"));
    }

    #[tokio::test]
    async fn test_skip_waiting_message() {
        let h = harness(&config("v1")).await;

        let outcome = h.manager.message(&serde_json::json!({ "type": "SKIP_WAITING" })).await.unwrap();
        assert_eq!(outcome, MessageOutcome::SkippedWaiting);
        assert_eq!(h.host.record().await.skip_waiting_calls, 1);

        let outcome = h.manager.message(&serde_json::json!({ "type": "PING" })).await.unwrap();
        assert_eq!(outcome, MessageOutcome::Ignored);
        assert_eq!(h.host.record().await.skip_waiting_calls, 1);

        let err = h.manager.message(&serde_json::json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, Error::InvalidMessage(_)));
    }

    #[tokio::test]
    async fn test_sync_waits_for_matching_tag() {
        let mut cfg = config("v1");
        cfg.sync_delay_ms = 20;
        let h = harness(&cfg).await;

        let started = Instant::now();
        assert_eq!(h.manager.sync("background-sync").await, SyncOutcome::Completed);
        assert!(started.elapsed() >= Duration::from_millis(20));

        assert_eq!(h.manager.sync("outbox").await, SyncOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_push_fills_defaults() {
        let h = harness(&config("v1")).await;

        let outcome = h.manager.push(Some(br#"{"body":"Record saved"}"#)).await.unwrap();
        let PushOutcome::Shown { notification_id, title } = outcome else {
            panic!("expected a notification");
        };
        assert_eq!(title, "swcache");

        let record = h.host.record().await;
        let shown = &record.notifications[0];
        assert_eq!(shown.id, notification_id);
        assert_eq!(shown.notification.body, "Record saved");
        assert_eq!(shown.notification.data.url, "https://app.test/");
        assert_eq!(shown.notification.vibrate, vec![100, 50, 100]);
        let actions: Vec<&str> = shown.notification.actions.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(actions, vec!["view", "close"]);
    }

    #[tokio::test]
    async fn test_push_empty_fields_use_defaults() {
        let h = harness(&config("v1")).await;

        let outcome = h.manager.push(Some(br#"{"title":"","body":"","url":""}"#)).await.unwrap();

        assert!(matches!(outcome, PushOutcome::Shown { ref title, .. } if title == "swcache"));
        let record = h.host.record().await;
        let shown = &record.notifications[0].notification;
        assert_eq!(shown.body, "New notification");
        assert_eq!(shown.data.url, "https://app.test/");
    }

    #[tokio::test]
    async fn test_push_without_data_does_nothing() {
        let h = harness(&config("v1")).await;
        assert_eq!(h.manager.push(None).await.unwrap(), PushOutcome::Ignored);
        assert_eq!(h.manager.push(Some(b"")).await.unwrap(), PushOutcome::Ignored);
        assert!(h.host.record().await.notifications.is_empty());

        assert!(matches!(h.manager.push(Some(b"{oops")).await, Err(Error::InvalidPayload(_))));
    }

    #[tokio::test]
    async fn test_view_click_focuses_root_window() {
        let h = harness(&config("v1")).await;
        h.host.add_window("https://app.test/records").await;
        let root = h.host.add_window("https://app.test/").await;

        let click = NotificationClick { notification_id: None, action: Some("view".into()) };
        let outcome = h.manager.notification_click(click).await.unwrap();

        match outcome {
            ClickOutcome::Focused(window) => assert_eq!(window.id, root.id),
            other => panic!("expected focus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_view_click_opens_window_when_none_at_root() {
        let h = harness(&config("v1")).await;
        h.manager.push(Some(br#"{"title":"Hi"}"#)).await.unwrap();
        let id = h.host.record().await.notifications[0].id.clone();

        let click = NotificationClick { notification_id: Some(id), action: Some("view".into()) };
        let outcome = h.manager.notification_click(click).await.unwrap();

        let ClickOutcome::Opened(window) = outcome else {
            panic!("expected a new window");
        };
        assert_eq!(window.url, "https://app.test/");
        assert!(h.host.record().await.notifications[0].closed);
    }

    #[tokio::test]
    async fn test_other_click_only_closes() {
        let h = harness(&config("v1")).await;
        h.manager.push(Some(br#"{"title":"Hi"}"#)).await.unwrap();
        let id = h.host.record().await.notifications[0].id.clone();

        let click = NotificationClick { notification_id: Some(id), action: Some("close".into()) };
        assert_eq!(h.manager.notification_click(click).await.unwrap(), ClickOutcome::Dismissed);

        let record = h.host.record().await;
        assert!(record.notifications[0].closed);
        assert!(record.windows.is_empty());
    }

    #[tokio::test]
    async fn test_state_subscription_sees_transitions() {
        let h = harness(&config("v1")).await;
        script_shell(&h.network);
        let mut rx = h.manager.subscribe_state();
        assert_eq!(*rx.borrow_and_update(), WorkerState::Parsed);

        h.manager.install().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), WorkerState::Installed);

        h.manager.activate().await.unwrap();
        assert_eq!(*rx.borrow(), WorkerState::Activated);
    }
}
