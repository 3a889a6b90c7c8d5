//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Request/response model shared by the network layer and the cache
//! - Cache storage with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{Cache, CacheDb, CachedRequest};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{Destination, Method, Request, RequestMode, Response, ResponseType};
