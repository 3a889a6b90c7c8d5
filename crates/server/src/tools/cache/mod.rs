//! Cache inspection MCP tools.
//!
//! Read-only views of the cache storage the worker manages.

pub mod entries;
pub mod keys;

pub use entries::{CacheEntriesParams, entries_impl};
pub use keys::keys_impl;
