//! Generation-tagged asset buckets in SQLite.
//!
//! A bucket becomes visible only when its install transaction commits
//! with `ready = 1`, so a half-installed generation can never serve.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, params};
use sha2::{Digest as _, Sha256};

use crate::{Error, Result};

const BUCKET_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS buckets (
    tag          TEXT PRIMARY KEY,
    ready        INTEGER NOT NULL DEFAULT 0,
    installed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS assets (
    tag          TEXT NOT NULL REFERENCES buckets(tag) ON DELETE CASCADE,
    path         TEXT NOT NULL,
    body         BLOB NOT NULL,
    content_type TEXT,
    content_hash TEXT NOT NULL,
    fetched_at   TEXT NOT NULL,
    PRIMARY KEY (tag, path)
);
";

/// One cached asset row.
#[derive(Debug, Clone)]
pub struct StoredAsset {
  pub path:         String,
  pub content_type: Option<String>,
  pub body:         Bytes,
  /// SHA-256 hex digest of the body.
  pub content_hash: String,
  pub fetched_at:   DateTime<Utc>,
}

/// The durable bucket database.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct BucketStore {
  conn: tokio_rusqlite::Connection,
}

impl BucketStore {
  pub async fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(|e| Error::StorageUnavailable(e.to_string()))?;
    Self::from_connection(conn).await
  }

  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(|e| Error::StorageUnavailable(e.to_string()))?;
    Self::from_connection(conn).await
  }

  async fn from_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(
          "PRAGMA journal_mode = WAL;
           PRAGMA synchronous = NORMAL;
           PRAGMA foreign_keys = ON;",
        )?;
        conn.execute_batch(BUCKET_SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(|e| Error::StorageUnavailable(e.to_string()))?;
    Ok(Self { conn })
  }

  /// Write a complete generation in one transaction and mark it ready.
  ///
  /// Re-installing an existing tag replaces its contents wholesale.
  pub async fn install(
    &self,
    tag: &str,
    entries: Vec<(String, Option<String>, Bytes)>,
  ) -> Result<()> {
    let tag = tag.to_owned();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        tx.execute(
          "INSERT INTO buckets (tag, ready, installed_at) VALUES (?1, 1, ?2)
           ON CONFLICT(tag) DO UPDATE
             SET ready = 1, installed_at = excluded.installed_at",
          params![tag, now],
        )?;
        tx.execute("DELETE FROM assets WHERE tag = ?1", params![tag])?;

        for (path, content_type, body) in &entries {
          let hash = hex::encode(Sha256::digest(body));
          tx.execute(
            "INSERT INTO assets
               (tag, path, body, content_type, content_hash, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![tag, path, &body[..], content_type, hash, now],
          )?;
        }

        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Refresh (or insert) a single asset in an existing ready bucket.
  pub async fn put(
    &self,
    tag: &str,
    path: &str,
    content_type: Option<String>,
    body: Bytes,
  ) -> Result<()> {
    let tag = tag.to_owned();
    let path = path.to_owned();
    self
      .conn
      .call(move |conn| {
        let ready: Option<bool> = conn
          .query_row(
            "SELECT ready FROM buckets WHERE tag = ?1",
            params![tag],
            |r| r.get(0),
          )
          .optional()?;
        if ready != Some(true) {
          return Ok(Some(tag));
        }

        let hash = hex::encode(Sha256::digest(&body));
        conn.execute(
          "INSERT INTO assets
             (tag, path, body, content_type, content_hash, fetched_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT(tag, path) DO UPDATE SET
             body = excluded.body,
             content_type = excluded.content_type,
             content_hash = excluded.content_hash,
             fetched_at = excluded.fetched_at",
          params![tag, path, &body[..], content_type, hash, Utc::now().to_rfc3339()],
        )?;
        Ok(None)
      })
      .await?
      .map_or(Ok(()), |tag| Err(Error::GenerationNotReady { tag }))
  }

  /// Read one asset from a ready bucket.
  pub async fn get(&self, tag: &str, path: &str) -> Result<Option<StoredAsset>> {
    let tag = tag.to_owned();
    let path = path.to_owned();
    let row: Option<(String, Vec<u8>, Option<String>, String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT a.path, a.body, a.content_type, a.content_hash,
                      a.fetched_at
               FROM assets a
               JOIN buckets b ON b.tag = a.tag AND b.ready = 1
               WHERE a.tag = ?1 AND a.path = ?2",
              params![tag, path],
              |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
            )
            .optional()?,
        )
      })
      .await?;

    row
      .map(|(path, body, content_type, content_hash, fetched_at)| {
        Ok(StoredAsset {
          path,
          content_type,
          body: Bytes::from(body),
          content_hash,
          fetched_at: DateTime::parse_from_rfc3339(&fetched_at)
            .map_err(|e| Error::Corrupt(e.to_string()))?
            .with_timezone(&Utc),
        })
      })
      .transpose()
  }

  /// Whether a ready bucket exists for `tag`.
  pub async fn is_ready(&self, tag: &str) -> Result<bool> {
    let tag = tag.to_owned();
    let ready: Option<bool> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT ready FROM buckets WHERE tag = ?1",
              params![tag],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(ready == Some(true))
  }

  /// All bucket tags, ready or not.
  pub async fn tags(&self) -> Result<Vec<String>> {
    let tags = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT tag FROM buckets ORDER BY tag")?;
        let tags = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(tags)
      })
      .await?;
    Ok(tags)
  }

  /// Delete every generation except `keep`. Returns the purged tags.
  pub async fn purge_except(&self, keep: &str) -> Result<Vec<String>> {
    let keep = keep.to_owned();
    let purged = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let stale: Vec<String> = {
          let mut stmt =
            tx.prepare("SELECT tag FROM buckets WHERE tag != ?1")?;
          stmt
            .query_map(params![keep], |r| r.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        // ON DELETE CASCADE clears the assets.
        tx.execute("DELETE FROM buckets WHERE tag != ?1", params![keep])?;
        tx.commit()?;
        Ok(stale)
      })
      .await?;
    Ok(purged)
  }
}
