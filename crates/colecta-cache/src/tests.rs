//! Lifecycle and policy tests against an in-memory bucket store and a
//! fake transport.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use sha2::{Digest as _, Sha256};
use url::Url;

use crate::{
  AssetFetcher, AssetManifest, BucketStore, CacheFirst, Error, FetchedAsset,
  NetworkFirst, Resolution, Result, ServeSource, ServiceCache,
};

const BASE: &str = "https://app.example.org/";

/// In-memory transport with an offline switch and a hit log.
struct FakeFetcher {
  responses: Mutex<HashMap<String, (u16, String)>>,
  online:    AtomicBool,
  hits:      Mutex<Vec<String>>,
}

impl FakeFetcher {
  fn new() -> Self {
    Self {
      responses: Mutex::new(HashMap::new()),
      online:    AtomicBool::new(true),
      hits:      Mutex::new(Vec::new()),
    }
  }

  fn with_shell(assets: &[&str]) -> Self {
    let fetcher = Self::new();
    for path in assets {
      fetcher.set(&format!("{BASE}{path}"), 200, &format!("body of {path}"));
    }
    fetcher
  }

  fn set(&self, url: &str, status: u16, body: &str) {
    self
      .responses
      .lock()
      .unwrap()
      .insert(url.to_owned(), (status, body.to_owned()));
  }

  fn remove(&self, url: &str) {
    self.responses.lock().unwrap().remove(url);
  }

  fn set_online(&self, online: bool) {
    self.online.store(online, Ordering::SeqCst);
  }

  fn hit_count(&self) -> usize {
    self.hits.lock().unwrap().len()
  }
}

impl AssetFetcher for &FakeFetcher {
  async fn fetch(&self, url: &Url) -> Result<FetchedAsset> {
    if !self.online.load(Ordering::SeqCst) {
      return Err(Error::NetworkFailure {
        url:    url.to_string(),
        reason: "offline".into(),
      });
    }
    self.hits.lock().unwrap().push(url.to_string());

    let found = self.responses.lock().unwrap().get(url.as_str()).cloned();
    match found {
      Some((status, body)) => Ok(FetchedAsset {
        status,
        content_type: Some("text/plain".into()),
        body: Bytes::from(body.into_bytes()),
      }),
      None => Ok(FetchedAsset {
        status:       404,
        content_type: None,
        body:         Bytes::new(),
      }),
    }
  }
}

const SHELL: &[&str] = &["index.html", "css/main.css", "js/app.js"];

fn manifest(tag: &str) -> AssetManifest {
  AssetManifest::new(tag, BASE, SHELL.iter().copied()).unwrap()
}

async fn buckets() -> BucketStore {
  BucketStore::open_in_memory().await.unwrap()
}

// ─── Install ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn install_writes_a_ready_generation() {
  let buckets = buckets().await;
  let fetcher = FakeFetcher::with_shell(SHELL);
  let cache =
    ServiceCache::new(buckets.clone(), &fetcher, NetworkFirst, manifest("v1"));

  cache.install().await.unwrap();

  assert!(buckets.is_ready("v1").await.unwrap());
  let asset = buckets.get("v1", "index.html").await.unwrap().unwrap();
  assert_eq!(&asset.body[..], b"body of index.html");
  assert_eq!(
    asset.content_hash,
    hex::encode(Sha256::digest(b"body of index.html"))
  );
}

#[tokio::test]
async fn install_aborts_when_an_asset_is_missing() {
  let buckets = buckets().await;
  let fetcher = FakeFetcher::with_shell(SHELL);
  fetcher.remove(&format!("{BASE}css/main.css"));
  let cache =
    ServiceCache::new(buckets.clone(), &fetcher, NetworkFirst, manifest("v1"));

  let err = cache.install().await.unwrap_err();
  assert!(matches!(err, Error::InstallAborted { status: 404, .. }));

  // The bucket never became ready; nothing from the partial fetch leaked.
  assert!(!buckets.is_ready("v1").await.unwrap());
  assert!(buckets.get("v1", "index.html").await.unwrap().is_none());
}

#[tokio::test]
async fn install_aborts_on_transport_failure() {
  let buckets = buckets().await;
  let fetcher = FakeFetcher::with_shell(SHELL);
  fetcher.set_online(false);
  let cache =
    ServiceCache::new(buckets.clone(), &fetcher, NetworkFirst, manifest("v1"));

  let err = cache.install().await.unwrap_err();
  assert!(matches!(err, Error::NetworkFailure { .. }));
  assert!(!buckets.is_ready("v1").await.unwrap());
}

// ─── Activate ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn activate_requires_a_ready_generation() {
  let buckets = buckets().await;
  let fetcher = FakeFetcher::with_shell(SHELL);
  let cache =
    ServiceCache::new(buckets, &fetcher, NetworkFirst, manifest("v1"));

  let err = cache.activate().await.unwrap_err();
  assert!(matches!(err, Error::GenerationNotReady { .. }));
}

#[tokio::test]
async fn activate_purges_stale_generations() {
  let buckets = buckets().await;
  let fetcher = FakeFetcher::with_shell(SHELL);

  for tag in ["v1", "v2"] {
    ServiceCache::new(buckets.clone(), &fetcher, NetworkFirst, manifest(tag))
      .install()
      .await
      .unwrap();
  }
  assert_eq!(buckets.tags().await.unwrap(), ["v1", "v2"]);

  let v2 =
    ServiceCache::new(buckets.clone(), &fetcher, NetworkFirst, manifest("v2"));
  v2.activate().await.unwrap();

  assert_eq!(buckets.tags().await.unwrap(), ["v2"]);
  // The superseded generation's assets are gone with it.
  assert!(buckets.get("v1", "index.html").await.unwrap().is_none());

  let status = v2.status().await.unwrap();
  assert!(status.current_ready);
  assert_eq!(status.tags, ["v2"]);
}

// ─── Network-first ───────────────────────────────────────────────────────────

fn served(resolution: Resolution) -> crate::Served {
  match resolution {
    Resolution::Served(s) => s,
    Resolution::PassThrough => panic!("expected a served response"),
  }
}

#[tokio::test]
async fn network_first_serves_network_and_refreshes_the_bucket() {
  let buckets = buckets().await;
  let fetcher = FakeFetcher::with_shell(SHELL);
  let cache =
    ServiceCache::new(buckets.clone(), &fetcher, NetworkFirst, manifest("v1"));
  cache.install().await.unwrap();

  // The origin ships a newer body after install.
  fetcher.set(&format!("{BASE}index.html"), 200, "fresher body");

  let s = served(cache.serve(&format!("{BASE}index.html")).await.unwrap());
  assert_eq!(s.source, ServeSource::Network);
  assert_eq!(&s.body[..], b"fresher body");

  // The bucket now holds the refreshed copy.
  let stored = buckets.get("v1", "index.html").await.unwrap().unwrap();
  assert_eq!(&stored.body[..], b"fresher body");
}

#[tokio::test]
async fn network_first_falls_back_to_cache_when_offline() {
  let buckets = buckets().await;
  let fetcher = FakeFetcher::with_shell(SHELL);
  let cache =
    ServiceCache::new(buckets, &fetcher, NetworkFirst, manifest("v1"));
  cache.install().await.unwrap();

  fetcher.set_online(false);

  let s = served(cache.serve(&format!("{BASE}index.html")).await.unwrap());
  assert_eq!(s.source, ServeSource::Cache);
  assert_eq!(&s.body[..], b"body of index.html");
}

#[tokio::test]
async fn network_first_fails_definitely_when_both_miss() {
  let buckets = buckets().await;
  let fetcher = FakeFetcher::with_shell(SHELL);
  let cache =
    ServiceCache::new(buckets, &fetcher, NetworkFirst, manifest("v1"));
  cache.install().await.unwrap();

  fetcher.set_online(false);

  let err = cache
    .serve(&format!("{BASE}never-cached.html"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Unavailable { .. }));
}

#[tokio::test]
async fn network_first_never_caches_cross_origin_responses() {
  let buckets = buckets().await;
  let fetcher = FakeFetcher::with_shell(SHELL);
  fetcher.set("https://cdn.example.com/lib.js", 200, "library");
  let cache =
    ServiceCache::new(buckets.clone(), &fetcher, NetworkFirst, manifest("v1"));
  cache.install().await.unwrap();

  let s = served(cache.serve("https://cdn.example.com/lib.js").await.unwrap());
  assert_eq!(s.source, ServeSource::Network);
  assert_eq!(&s.body[..], b"library");

  assert!(buckets.get("v1", "lib.js").await.unwrap().is_none());
}

#[tokio::test]
async fn network_first_never_caches_non_200_responses() {
  let buckets = buckets().await;
  let fetcher = FakeFetcher::with_shell(SHELL);
  fetcher.set(&format!("{BASE}flaky.html"), 500, "server error");
  let cache =
    ServiceCache::new(buckets.clone(), &fetcher, NetworkFirst, manifest("v1"));
  cache.install().await.unwrap();

  let s = served(cache.serve(&format!("{BASE}flaky.html")).await.unwrap());
  assert_eq!(s.status, 500);
  assert_eq!(s.source, ServeSource::Network);

  assert!(buckets.get("v1", "flaky.html").await.unwrap().is_none());
}

// ─── Cache-first ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn cache_first_serves_hits_without_touching_the_network() {
  let buckets = buckets().await;
  let fetcher = FakeFetcher::with_shell(SHELL);
  let cache =
    ServiceCache::new(buckets, &fetcher, CacheFirst, manifest("v1"));
  cache.install().await.unwrap();

  let hits_after_install = fetcher.hit_count();

  let s = served(cache.serve(&format!("{BASE}index.html")).await.unwrap());
  assert_eq!(s.source, ServeSource::Cache);
  assert_eq!(fetcher.hit_count(), hits_after_install);
}

#[tokio::test]
async fn cache_first_falls_through_to_network_on_miss() {
  let buckets = buckets().await;
  let fetcher = FakeFetcher::with_shell(SHELL);
  fetcher.set(&format!("{BASE}extra.html"), 200, "extra");
  let cache =
    ServiceCache::new(buckets, &fetcher, CacheFirst, manifest("v1"));
  cache.install().await.unwrap();

  let s = served(cache.serve(&format!("{BASE}extra.html")).await.unwrap());
  assert_eq!(s.source, ServeSource::Network);
  assert_eq!(&s.body[..], b"extra");
}

// ─── Interception boundary ───────────────────────────────────────────────────

#[tokio::test]
async fn non_network_schemes_pass_through_untouched() {
  let buckets = buckets().await;
  let fetcher = FakeFetcher::with_shell(SHELL);
  let cache =
    ServiceCache::new(buckets, &fetcher, NetworkFirst, manifest("v1"));

  let resolution =
    cache.serve("app-internal://settings/panel").await.unwrap();
  assert!(matches!(resolution, Resolution::PassThrough));
  assert_eq!(fetcher.hit_count(), 0);
}
