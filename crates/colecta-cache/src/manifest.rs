//! The asset manifest: which resources a cache generation must hold.

use url::Url;

use crate::{Error, Result};

/// The application shell: every routable page and static asset that must
/// be present for the app to work offline. Install fails unless all of
/// them fetch.
pub const APP_SHELL: &[&str] = &[
  "index.html",
  "dashboard.html",
  "capture.html",
  "review.html",
  "reports.html",
  "admin.html",
  "css/main.css",
  "js/app.js",
  "js/session.js",
  "js/store.js",
  "js/signature.js",
  "manifest.webmanifest",
];

/// One cache generation's identity: a version tag, the origin assets are
/// served from, and the enumerated asset list.
///
/// The tag is an independent version space from the store's schema
/// version.
#[derive(Debug, Clone)]
pub struct AssetManifest {
  pub tag:      String,
  pub base_url: Url,
  pub assets:   Vec<String>,
}

impl AssetManifest {
  /// Build a manifest after validating every asset path.
  pub fn new(
    tag: impl Into<String>,
    base_url: &str,
    assets: impl IntoIterator<Item = impl Into<String>>,
  ) -> Result<Self> {
    let base_url = Url::parse(base_url)
      .map_err(|_| Error::InvalidUrl(base_url.to_owned()))?;
    if base_url.cannot_be_a_base() {
      return Err(Error::InvalidUrl(base_url.to_string()));
    }

    let assets: Vec<String> = assets.into_iter().map(Into::into).collect();
    for path in &assets {
      if !valid_path(path) {
        return Err(Error::InvalidAssetPath(path.clone()));
      }
    }

    Ok(Self { tag: tag.into(), base_url, assets })
  }

  /// The standard app-shell manifest for a given generation tag.
  pub fn app_shell(tag: impl Into<String>, base_url: &str) -> Result<Self> {
    Self::new(tag, base_url, APP_SHELL.iter().copied())
  }

  /// Absolute URL for one manifest asset.
  pub fn url_for(&self, path: &str) -> Result<Url> {
    self
      .base_url
      .join(path)
      .map_err(|_| Error::InvalidAssetPath(path.to_owned()))
  }

  /// The bucket key for a request URL, or `None` when the request is not
  /// same-origin (cross-origin responses are never cached).
  pub fn cache_key(&self, url: &Url) -> Option<String> {
    if !same_origin(url, &self.base_url) {
      return None;
    }
    let path = url.path().trim_start_matches('/');
    // A navigation to the origin root resolves to the entry point.
    if path.is_empty() {
      return Some("index.html".to_owned());
    }
    Some(path.to_owned())
  }
}

fn same_origin(a: &Url, b: &Url) -> bool {
  a.scheme() == b.scheme()
    && a.host_str() == b.host_str()
    && a.port_or_known_default() == b.port_or_known_default()
}

/// Asset paths are relative, traversal-free and scheme-free — they name
/// rows in the bucket, never arbitrary locations.
fn valid_path(path: &str) -> bool {
  !path.is_empty()
    && !path.starts_with('/')
    && !path.contains(':')
    && path.split('/').all(|seg| !seg.is_empty() && seg != "..")
}
