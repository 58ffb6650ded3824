//! Error type for `colecta-cache`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The cache database itself could not be opened.
  #[error("cache storage unavailable: {0}")]
  StorageUnavailable(String),

  #[error("http client error: {0}")]
  Client(String),

  /// The transport failed before producing any response. Recovered
  /// transparently by falling back to the cache where possible.
  #[error("network failure fetching {url}: {reason}")]
  NetworkFailure { url: String, reason: String },

  /// One asset of the manifest did not fetch cleanly, so the whole
  /// generation install is abandoned.
  #[error("install aborted: {url} returned status {status}")]
  InstallAborted { url: String, status: u16 },

  /// Activation (or a cache write) was attempted against a generation
  /// that never finished installing.
  #[error("cache generation {tag:?} is not ready")]
  GenerationNotReady { tag: String },

  /// Both the network and the cache came up empty — the definite failure
  /// at the end of the fallback chain.
  #[error("resource unavailable from network and cache: {url}")]
  Unavailable { url: String },

  #[error("invalid asset path {0:?}")]
  InvalidAssetPath(String),

  #[error("invalid url {0:?}")]
  InvalidUrl(String),

  #[error("corrupt cache row: {0}")]
  Corrupt(String),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
