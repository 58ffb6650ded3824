//! Durable asset cache for offline-first operation.
//!
//! A finite, enumerated set of application assets is kept in
//! generation-tagged buckets inside a SQLite database. The
//! install/activate/serve lifecycle mirrors how the cache is driven in
//! production: a new generation installs wholesale or not at all,
//! activation garbage-collects superseded generations, and every request
//! is resolved by a pluggable [`policy::FetchPolicy`] trading freshness
//! against offline availability.

pub mod buckets;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod policy;
pub mod service;

pub use buckets::{BucketStore, StoredAsset};
pub use error::{Error, Result};
pub use fetch::{AssetFetcher, FetchedAsset, HttpFetcher};
pub use manifest::AssetManifest;
pub use policy::{CacheFirst, FetchPolicy, NetworkFirst, Served, ServeSource};
pub use service::{CacheStatus, Resolution, ServiceCache};

#[cfg(test)]
mod tests;
