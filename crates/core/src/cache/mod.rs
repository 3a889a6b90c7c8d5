//! SQLite-backed response cache.
//!
//! A persistent set of named stores, each mapping request identities to
//! captured responses, with async access via tokio-rusqlite. It supports:
//!
//! - Request identity keys hashed with SHA-256
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - All-or-nothing batch writes
//! - Wholesale store deletion with cascading entry removal

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{Cache, CachedRequest};
pub use storage::StoreInfo;
