//! Which requests and responses the interception policy touches.

use swcache_client::is_same_origin;
use swcache_core::{Response, ResponseType};
use url::{Origin, Url};

/// Decides whether a network response may be written back into the store.
#[derive(Debug, Clone)]
pub struct RuntimeCacheRule {
    origin: Origin,
    root_path: String,
    index_path: String,
    extensions: Vec<String>,
    api_prefix: Option<String>,
}

impl RuntimeCacheRule {
    pub fn new(scope: &Url, index_url: &Url, extensions: &[String], api_prefix: Option<&str>) -> Self {
        Self {
            origin: scope.origin(),
            root_path: scope.path().to_string(),
            index_path: index_url.path().to_string(),
            extensions: extensions.to_vec(),
            api_prefix: api_prefix.map(str::to_string),
        }
    }

    /// Only a complete same-origin 200 is worth keeping.
    pub fn is_cacheable_response(response: &Response) -> bool {
        response.status == 200 && response.response_type == ResponseType::Basic
    }

    /// Whether a successful response for `url` should be stored.
    ///
    /// With no extension list every same-origin URL qualifies. Otherwise the
    /// URL must be the scope root, the index document, or have a path
    /// containing one of the extensions.
    pub fn allows(&self, url: &Url) -> bool {
        if !is_same_origin(url, &self.origin) || self.is_api(url) {
            return false;
        }
        if self.extensions.is_empty() {
            return true;
        }
        let path = url.path();
        path == self.root_path || path == self.index_path || self.extensions.iter().any(|ext| path.contains(ext.as_str()))
    }

    /// Same-origin request under the API prefix.
    pub fn is_api(&self, url: &Url) -> bool {
        match &self.api_prefix {
            Some(prefix) => is_same_origin(url, &self.origin) && url.path().starts_with(prefix.as_str()),
            None => false,
        }
    }
}
