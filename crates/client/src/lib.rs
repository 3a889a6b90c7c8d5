//! Network client code for swcache.
//!
//! This crate provides the `Network` seam the worker fetches through, its
//! reqwest implementation, and URL resolution against the worker scope.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, Network, UrlError, canonicalize, is_same_origin, resolve};
