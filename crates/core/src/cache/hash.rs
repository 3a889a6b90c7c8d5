//! Request identity keys.

use sha2::{Digest, Sha256};

use crate::http::Request;

/// Compute the entry key for a request identity.
///
/// `vary` is the already-serialized header subset (`name: value` lines).
pub fn compute_cache_key(method: &str, url: &str, vary: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hasher.update(b"\n");
    hasher.update(vary.as_bytes());
    hex::encode(hasher.finalize())
}

/// Entry key for `request`, using `key_headers` as the header subset.
///
/// The URL fragment never takes part in the identity. Missing headers
/// contribute an empty value so presence and absence stay distinct from
/// other values.
pub fn request_key(request: &Request, key_headers: &[String]) -> String {
    let mut url = request.url.clone();
    url.set_fragment(None);

    let vary = key_headers
        .iter()
        .map(|name| format!("{name}: {}", request.header(name).unwrap_or("")))
        .collect::<Vec<_>>()
        .join("\n");

    compute_cache_key(request.method.as_str(), url.as_str(), &vary)
}
