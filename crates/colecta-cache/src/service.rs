//! The cache lifecycle driver: install, activate, serve.

use url::Url;

use crate::buckets::BucketStore;
use crate::fetch::AssetFetcher;
use crate::manifest::AssetManifest;
use crate::policy::{FetchPolicy, Served};
use crate::{Error, Result};

/// The outcome of intercepting one request.
#[derive(Debug, Clone)]
pub enum Resolution {
  Served(Served),
  /// Non-network scheme — never intercepted, never cached.
  PassThrough,
}

/// Introspection snapshot for diagnostics.
#[derive(Debug, Clone)]
pub struct CacheStatus {
  pub current_tag:   String,
  pub current_ready: bool,
  pub tags:          Vec<String>,
}

/// Lifecycle driver for one cache generation.
///
/// Both the fetcher and the policy are injected, so strategies can be
/// swapped and tested in isolation.
pub struct ServiceCache<F, P> {
  buckets:  BucketStore,
  fetcher:  F,
  policy:   P,
  manifest: AssetManifest,
}

impl<F: AssetFetcher, P: FetchPolicy> ServiceCache<F, P> {
  pub fn new(
    buckets: BucketStore,
    fetcher: F,
    policy: P,
    manifest: AssetManifest,
  ) -> Self {
    Self { buckets, fetcher, policy, manifest }
  }

  /// Fetch the enumerated asset list and write it wholesale into the
  /// bucket named by the manifest tag. Any single failed fetch aborts
  /// the install — the generation is all-or-nothing.
  pub async fn install(&self) -> Result<()> {
    let mut entries = Vec::with_capacity(self.manifest.assets.len());
    for path in &self.manifest.assets {
      let url = self.manifest.url_for(path)?;
      let asset = self.fetcher.fetch(&url).await?;
      if !asset.is_success() {
        return Err(Error::InstallAborted {
          url:    url.to_string(),
          status: asset.status,
        });
      }
      entries.push((path.clone(), asset.content_type, asset.body));
    }

    self.buckets.install(&self.manifest.tag, entries).await?;
    tracing::info!(
      tag = %self.manifest.tag,
      assets = self.manifest.assets.len(),
      "cache generation installed"
    );
    Ok(())
  }

  /// Garbage-collect superseded generations and claim control. Requires
  /// a ready bucket for the current tag.
  pub async fn activate(&self) -> Result<()> {
    if !self.buckets.is_ready(&self.manifest.tag).await? {
      return Err(Error::GenerationNotReady {
        tag: self.manifest.tag.clone(),
      });
    }

    let purged = self.buckets.purge_except(&self.manifest.tag).await?;
    if !purged.is_empty() {
      tracing::info!(tag = %self.manifest.tag, ?purged, "stale generations purged");
    }
    Ok(())
  }

  /// Resolve one intercepted request.
  ///
  /// Non-http(s) URLs pass through untouched. Everything else goes to
  /// the policy, which decides between cache and network.
  pub async fn serve(&self, raw_url: &str) -> Result<Resolution> {
    let url = Url::parse(raw_url)
      .map_err(|_| Error::InvalidUrl(raw_url.to_owned()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
      return Ok(Resolution::PassThrough);
    }

    let key = self.manifest.cache_key(&url);
    let served = self
      .policy
      .resolve(
        &self.buckets,
        &self.fetcher,
        &self.manifest.tag,
        key.as_deref(),
        &url,
      )
      .await?;
    Ok(Resolution::Served(served))
  }

  pub async fn status(&self) -> Result<CacheStatus> {
    Ok(CacheStatus {
      current_tag:   self.manifest.tag.clone(),
      current_ready: self.buckets.is_ready(&self.manifest.tag).await?,
      tags:          self.buckets.tags().await?,
    })
  }
}
