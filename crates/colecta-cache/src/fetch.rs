//! The [`AssetFetcher`] seam over the network, and its reqwest
//! implementation.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use url::Url;

use crate::{Error, Result};

/// An upper bound on any single network attempt, so serving can always
/// resolve to a response or a definite failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// What came back from one network attempt. A non-200 status is still a
/// response — only transport failures are errors.
#[derive(Debug, Clone)]
pub struct FetchedAsset {
  pub status:       u16,
  pub content_type: Option<String>,
  pub body:         Bytes,
}

impl FetchedAsset {
  /// A direct, cacheable response.
  pub fn is_success(&self) -> bool { self.status == 200 }
}

/// Abstraction over the transport. Production uses [`HttpFetcher`];
/// tests substitute an in-memory fake with an offline switch.
pub trait AssetFetcher: Send + Sync {
  fn fetch(
    &self,
    url: &Url,
  ) -> impl Future<Output = Result<FetchedAsset>> + Send;
}

/// reqwest-backed fetcher.
#[derive(Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
}

impl HttpFetcher {
  pub fn new() -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| Error::Client(e.to_string()))?;
    Ok(Self { client })
  }
}

impl AssetFetcher for HttpFetcher {
  async fn fetch(&self, url: &Url) -> Result<FetchedAsset> {
    let failure = |e: reqwest::Error| Error::NetworkFailure {
      url:    url.to_string(),
      reason: e.to_string(),
    };

    let response = self.client.get(url.clone()).send().await.map_err(failure)?;
    let status = response.status().as_u16();
    let content_type = response
      .headers()
      .get(reqwest::header::CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(str::to_owned);
    let body = response.bytes().await.map_err(failure)?;

    Ok(FetchedAsset { status, content_type, body })
  }
}
