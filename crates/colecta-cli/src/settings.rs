//! Runtime configuration: TOML file plus `COLECTA_*` environment
//! overrides, with defaults under the platform data directory.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Which serving policy the cache commands use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
  NetworkFirst,
  CacheFirst,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub store_path:   PathBuf,
  pub cache_db:     PathBuf,
  pub session_path: PathBuf,
  /// Origin the asset manifest is served from.
  pub base_url:     String,
  /// Cache generation tag — independent of the store schema version.
  pub cache_tag:    String,
  pub policy:       PolicyKind,
}

impl Default for Settings {
  fn default() -> Self {
    let data = data_dir();
    Self {
      store_path:   data.join("store.db"),
      cache_db:     data.join("cache.db"),
      session_path: data.join("session.json"),
      base_url:     "http://127.0.0.1:8000/".to_owned(),
      cache_tag:    "v1".to_owned(),
      policy:       PolicyKind::NetworkFirst,
    }
  }
}

impl Settings {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("COLECTA"))
      .build()
      .context("failed to read config file")?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;

    settings.store_path = expand_tilde(&settings.store_path);
    settings.cache_db = expand_tilde(&settings.cache_db);
    settings.session_path = expand_tilde(&settings.session_path);
    Ok(settings)
  }
}

fn data_dir() -> PathBuf {
  dirs::data_dir()
    .unwrap_or_else(|| PathBuf::from("."))
    .join("colecta")
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}
