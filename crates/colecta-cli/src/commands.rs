//! Command implementations for the `colecta` binary.

use std::path::Path;

use anyhow::{Context as _, bail};
use chrono::Utc;

use colecta_cache::{
  AssetManifest, BucketStore, CacheFirst, FetchPolicy, HttpFetcher,
  NetworkFirst, Resolution, ServiceCache,
};
use colecta_core::auth;
use colecta_core::record::{
  Capture, CapturePayload, CaptureStatus, GeoPoint, Indicator, Project, Role,
  SyncStatus, User,
};
use colecta_core::store::RecordStore as _;
use colecta_core::table::{RecordId, Table, TableName};
use colecta_store_sqlite::SqliteStore;

use crate::session;
use crate::settings::{PolicyKind, Settings};

// ─── Store commands ──────────────────────────────────────────────────────────

async fn open_store(settings: &Settings) -> anyhow::Result<SqliteStore> {
  if let Some(parent) = settings.store_path.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| {
      format!("failed to open store at {:?}", settings.store_path)
    })
}

pub async fn status(settings: &Settings) -> anyhow::Result<()> {
  let store = open_store(settings).await?;

  println!("store:          {:?}", settings.store_path);
  println!("schema version: {}", store.schema_version().await?);
  for table in TableName::ALL {
    println!("{:<15} {}", format!("{table}:"), store.count(table).await?);
  }

  match session::load(&settings.session_path)? {
    Some(s) => println!("session:        {} ({})", s.email, s.role.label()),
    None => println!("session:        none"),
  }
  Ok(())
}

pub async fn seed_check(settings: &Settings) -> anyhow::Result<()> {
  let store = open_store(settings).await?;
  store.ensure_seeded().await?;
  println!(
    "seed verified: {} indicators, {} captures",
    store.count(TableName::Indicators).await?,
    store.count(TableName::Captures).await?
  );
  Ok(())
}

pub async fn reset(settings: &Settings, yes: bool) -> anyhow::Result<()> {
  if !yes {
    bail!("reset deletes the entire store; re-run with --yes to confirm");
  }
  let store = open_store(settings).await?;
  store.reset().await?;
  println!("store deleted; it will be recreated and reseeded on next open");
  Ok(())
}

pub async fn list(settings: &Settings, table: &str) -> anyhow::Result<()> {
  let store = open_store(settings).await?;
  match TableName::parse(table)? {
    TableName::Users => print_all::<User>(&store).await,
    TableName::Projects => print_all::<Project>(&store).await,
    TableName::Indicators => print_all::<Indicator>(&store).await,
    TableName::Captures => print_all::<Capture>(&store).await,
  }
}

async fn print_all<T: Table>(store: &SqliteStore) -> anyhow::Result<()> {
  for record in store.get_all::<T>().await? {
    println!("{}", serde_json::to_string(&record)?);
  }
  Ok(())
}

pub async fn show(
  settings: &Settings,
  table: &str,
  id: RecordId,
) -> anyhow::Result<()> {
  let store = open_store(settings).await?;
  match TableName::parse(table)? {
    TableName::Users => print_one::<User>(&store, id).await,
    TableName::Projects => print_one::<Project>(&store, id).await,
    TableName::Indicators => print_one::<Indicator>(&store, id).await,
    TableName::Captures => print_one::<Capture>(&store, id).await,
  }
}

async fn print_one<T: Table>(
  store: &SqliteStore,
  id: RecordId,
) -> anyhow::Result<()> {
  match store.get_by_id::<T>(id).await? {
    Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
    None => println!("no {} record with id {id}", T::TABLE),
  }
  Ok(())
}

pub async fn add_user(
  settings: &Settings,
  email: String,
  name: String,
  role: Role,
) -> anyhow::Result<()> {
  let password = prompt_password()?;
  let store = open_store(settings).await?;

  let user = User {
    id: None,
    email,
    name,
    password_hash: auth::hash_password(&password)?,
    role,
  };
  let id = store.add(user).await?;
  println!("user {id} created");
  Ok(())
}

pub async fn record_capture(
  settings: &Settings,
  indicator_id: RecordId,
  total: Option<u32>,
  scores: Option<Vec<u8>>,
  location: Option<GeoPoint>,
) -> anyhow::Result<()> {
  let store = open_store(settings).await?;
  // Creation and seeding can race with an earlier half-finished session;
  // verify before trusting indicator data.
  store.ensure_seeded().await?;

  let indicator: Indicator = store
    .get_by_id(indicator_id)
    .await?
    .with_context(|| format!("indicator {indicator_id} not found"))?;

  let payload = match (total, scores) {
    (Some(total), None) => CapturePayload::Count { total },
    (None, Some(scores)) => CapturePayload::Participants { scores },
    _ => bail!("provide exactly one of --total or --scores"),
  };

  let capture = Capture {
    id: None,
    indicator_id,
    indicator_name: indicator.name.clone(),
    axis: indicator.axis,
    captured_at: Utc::now(),
    status: CaptureStatus::Draft,
    sync_status: SyncStatus::Pending,
    payload,
    location,
  };

  let id = store.add(capture).await?;
  println!("capture {id} recorded against \"{}\"", indicator.name);
  Ok(())
}

pub async fn review(
  settings: &Settings,
  id: RecordId,
  verdict: CaptureStatus,
) -> anyhow::Result<()> {
  let store = open_store(settings).await?;

  let mut capture: Capture = store
    .get_by_id(id)
    .await?
    .with_context(|| format!("capture {id} not found"))?;

  capture.status = verdict;
  // sync_status stays as-is: reconciliation belongs to a sync engine,
  // not the review step.
  store.update(capture).await?;
  println!("capture {id} marked {verdict:?}");
  Ok(())
}

// ─── Session commands ────────────────────────────────────────────────────────

pub async fn login(settings: &Settings, email: String) -> anyhow::Result<()> {
  let password = prompt_password()?;
  let store = open_store(settings).await?;

  let users: Vec<User> = store.get_all().await?;
  let session = session::authenticate(&users, &email, &password)?;
  session::save(&session, &settings.session_path)?;
  println!("logged in as {} ({})", session.name, session.role.label());
  Ok(())
}

pub fn logout(settings: &Settings) -> anyhow::Result<()> {
  if session::destroy(&settings.session_path)? {
    println!("logged out");
  } else {
    println!("no active session");
  }
  Ok(())
}

pub fn whoami(settings: &Settings) -> anyhow::Result<()> {
  match session::load(&settings.session_path)? {
    Some(s) => {
      println!("{} <{}>", s.name, s.email);
      println!("role:      {}", s.role.label());
      println!("logged in: {}", s.logged_in_at.to_rfc3339());
    }
    None => println!("no active session"),
  }
  Ok(())
}

/// Read a password from stdin (no echo guarantees on plain pipes).
fn prompt_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead as _, Write as _};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

// ─── Cache commands ──────────────────────────────────────────────────────────

async fn service<P: FetchPolicy>(
  settings: &Settings,
  policy: P,
) -> anyhow::Result<ServiceCache<HttpFetcher, P>> {
  if let Some(parent) = settings.cache_db.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let buckets = BucketStore::open(&settings.cache_db)
    .await
    .with_context(|| {
      format!("failed to open cache at {:?}", settings.cache_db)
    })?;
  let manifest =
    AssetManifest::app_shell(&settings.cache_tag, &settings.base_url)?;
  Ok(ServiceCache::new(buckets, HttpFetcher::new()?, policy, manifest))
}

pub async fn cache_install(settings: &Settings) -> anyhow::Result<()> {
  match settings.policy {
    PolicyKind::NetworkFirst => {
      service(settings, NetworkFirst).await?.install().await?
    }
    PolicyKind::CacheFirst => {
      service(settings, CacheFirst).await?.install().await?
    }
  }
  println!("generation {:?} installed", settings.cache_tag);
  Ok(())
}

pub async fn cache_activate(settings: &Settings) -> anyhow::Result<()> {
  match settings.policy {
    PolicyKind::NetworkFirst => {
      service(settings, NetworkFirst).await?.activate().await?
    }
    PolicyKind::CacheFirst => {
      service(settings, CacheFirst).await?.activate().await?
    }
  }
  println!("generation {:?} active", settings.cache_tag);
  Ok(())
}

pub async fn cache_fetch(settings: &Settings, url: &str) -> anyhow::Result<()> {
  let resolution = match settings.policy {
    PolicyKind::NetworkFirst => {
      service(settings, NetworkFirst).await?.serve(url).await?
    }
    PolicyKind::CacheFirst => {
      service(settings, CacheFirst).await?.serve(url).await?
    }
  };

  match resolution {
    Resolution::Served(s) => println!(
      "{} — {} bytes from {:?} ({})",
      s.status,
      s.body.len(),
      s.source,
      s.content_type.as_deref().unwrap_or("unknown content type"),
    ),
    Resolution::PassThrough => {
      println!("pass-through: non-network scheme is never intercepted")
    }
  }
  Ok(())
}

pub async fn cache_status(settings: &Settings) -> anyhow::Result<()> {
  let status = match settings.policy {
    PolicyKind::NetworkFirst => {
      service(settings, NetworkFirst).await?.status().await?
    }
    PolicyKind::CacheFirst => {
      service(settings, CacheFirst).await?.status().await?
    }
  };

  println!("current tag: {} (ready: {})", status.current_tag, status.current_ready);
  println!("buckets:     {:?}", status.tags);
  Ok(())
}
