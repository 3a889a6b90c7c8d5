//! Test doubles shared by the worker's unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use swcache_core::{Error, Request, Response, ResponseType};
use url::Url;

use crate::host::{Host, LocalHost, Notification, WindowClient};
use crate::manager::CacheManager;
use crate::settings::WorkerSettings;
use swcache_core::{AppConfig, CacheDb};

#[derive(Debug, Clone)]
enum Reply {
    Respond(Response),
    Fail,
}

/// Network that answers from a script and records every request it sees.
///
/// Unscripted URLs fail as if the network were down.
#[derive(Debug, Default)]
pub struct ScriptedNetwork {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<Request>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `status` and `body` as a same-origin response.
    pub fn respond(&self, url: &str, status: u16, body: &str) {
        let url = Url::parse(url).unwrap();
        let response = Response::new(status, body.to_string())
            .with_type(ResponseType::Basic)
            .with_url(url.clone());
        self.respond_with(url.as_str(), response);
    }

    pub fn respond_with(&self, url: &str, response: Response) {
        let key = Url::parse(url).unwrap().to_string();
        self.replies.lock().unwrap().insert(key, Reply::Respond(response));
    }

    pub fn fail(&self, url: &str) {
        let key = Url::parse(url).unwrap().to_string();
        self.replies.lock().unwrap().insert(key, Reply::Fail);
    }

    /// Take the network down: every URL fails from now on.
    pub fn go_offline(&self) {
        let mut replies = self.replies.lock().unwrap();
        for reply in replies.values_mut() {
            *reply = Reply::Fail;
        }
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl crate::Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(request.clone());
        let reply = self.replies.lock().unwrap_or_else(PoisonError::into_inner).get(request.url.as_str()).cloned();
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail) | None => Err(Error::Network(format!("connection refused: {}", request.url))),
        }
    }
}

/// Local host whose `skip_waiting` is refused; everything else is delegated.
#[derive(Default)]
pub struct RefusingHost {
    pub inner: LocalHost,
}

#[async_trait]
impl Host for RefusingHost {
    async fn skip_waiting(&self) -> Result<(), Error> {
        Err(Error::Host("skip waiting refused".into()))
    }

    async fn claim_clients(&self) -> Result<usize, Error> {
        self.inner.claim_clients().await
    }

    async fn window_clients(&self) -> Result<Vec<WindowClient>, Error> {
        self.inner.window_clients().await
    }

    async fn focus(&self, client_id: &str) -> Result<WindowClient, Error> {
        self.inner.focus(client_id).await
    }

    async fn open_window(&self, url: &Url) -> Result<WindowClient, Error> {
        self.inner.open_window(url).await
    }

    async fn show_notification(&self, notification: Notification) -> Result<String, Error> {
        self.inner.show_notification(notification).await
    }

    async fn close_notification(&self, id: &str) -> Result<(), Error> {
        self.inner.close_notification(id).await
    }
}

/// A manager over an in-memory store, a scripted network and a local host.
pub struct Harness {
    pub manager: CacheManager,
    pub db: CacheDb,
    pub network: Arc<ScriptedNetwork>,
    pub host: Arc<LocalHost>,
}

pub const SCOPE: &str = "https://app.test/";

pub fn config(version: &str) -> AppConfig {
    AppConfig {
        cache_version: version.to_string(),
        scope: SCOPE.to_string(),
        precache: vec!["./".into(), "./index.html".into()],
        index_path: "./index.html".into(),
        ..Default::default()
    }
}

pub async fn harness(config: &AppConfig) -> Harness {
    let db = CacheDb::open_in_memory().await.unwrap();
    harness_on(db, config)
}

/// Build a manager on an existing store, as a newly deployed worker would.
pub fn harness_on(db: CacheDb, config: &AppConfig) -> Harness {
    let network = Arc::new(ScriptedNetwork::new());
    let host = Arc::new(LocalHost::new());
    let settings = WorkerSettings::from_config(config).unwrap();
    let manager = CacheManager::new(db.clone(), network.clone(), host.clone(), settings);
    Harness { manager, db, network, host }
}

pub fn url(path: &str) -> Url {
    Url::parse(SCOPE).unwrap().join(path).unwrap()
}
