//! Pluggable request-resolution policies.
//!
//! The serving strategy has changed over the product's lifetime, so it is
//! a seam: one `resolve` capability, two implementations. [`NetworkFirst`]
//! is the authoritative current policy.

use std::future::Future;

use bytes::Bytes;
use url::Url;

use crate::buckets::{BucketStore, StoredAsset};
use crate::fetch::{AssetFetcher, FetchedAsset};
use crate::{Error, Result};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeSource {
  Network,
  Cache,
}

/// A resolved response.
#[derive(Debug, Clone)]
pub struct Served {
  pub status:       u16,
  pub content_type: Option<String>,
  pub body:         Bytes,
  pub source:       ServeSource,
}

impl Served {
  fn from_network(asset: FetchedAsset) -> Self {
    Self {
      status:       asset.status,
      content_type: asset.content_type,
      body:         asset.body,
      source:       ServeSource::Network,
    }
  }

  fn from_cache(asset: StoredAsset) -> Self {
    Self {
      status:       200,
      content_type: asset.content_type,
      body:         asset.body,
      source:       ServeSource::Cache,
    }
  }
}

/// How one intercepted request is answered.
///
/// `key` is the bucket key for the request, present only for same-origin
/// URLs — a `None` key means the response can be served but never cached
/// or looked up.
pub trait FetchPolicy: Send + Sync {
  fn resolve<F: AssetFetcher>(
    &self,
    buckets: &BucketStore,
    fetcher: &F,
    tag: &str,
    key: Option<&str>,
    url: &Url,
  ) -> impl Future<Output = Result<Served>> + Send;
}

// ─── Cache-first ─────────────────────────────────────────────────────────────

/// Try the durable cache; on miss, fall through to the network.
///
/// Never writes the cache — the bucket holds exactly what install put
/// there.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheFirst;

impl FetchPolicy for CacheFirst {
  async fn resolve<F: AssetFetcher>(
    &self,
    buckets: &BucketStore,
    fetcher: &F,
    tag: &str,
    key: Option<&str>,
    url: &Url,
  ) -> Result<Served> {
    if let Some(key) = key
      && let Some(hit) = buckets.get(tag, key).await?
    {
      return Ok(Served::from_cache(hit));
    }
    let asset = fetcher.fetch(url).await?;
    Ok(Served::from_network(asset))
  }
}

// ─── Network-first with refresh ──────────────────────────────────────────────

/// Try the network; copy direct cacheable same-origin responses into the
/// current bucket (best-effort); fall back to the cache when offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkFirst;

impl FetchPolicy for NetworkFirst {
  async fn resolve<F: AssetFetcher>(
    &self,
    buckets: &BucketStore,
    fetcher: &F,
    tag: &str,
    key: Option<&str>,
    url: &Url,
  ) -> Result<Served> {
    match fetcher.fetch(url).await {
      Ok(asset) => {
        if asset.is_success()
          && let Some(key) = key
        {
          // A failed refresh must not fail the response.
          if let Err(e) = buckets
            .put(tag, key, asset.content_type.clone(), asset.body.clone())
            .await
          {
            tracing::warn!(%url, error = %e, "cache refresh failed");
          }
        }
        Ok(Served::from_network(asset))
      }
      Err(Error::NetworkFailure { .. }) => {
        if let Some(key) = key
          && let Some(hit) = buckets.get(tag, key).await?
        {
          tracing::debug!(%url, "offline; served from cache");
          return Ok(Served::from_cache(hit));
        }
        Err(Error::Unavailable { url: url.to_string() })
      }
      Err(other) => Err(other),
    }
  }
}
