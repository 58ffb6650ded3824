//! [`SqliteStore`] — the SQLite implementation of [`RecordStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, TransactionBehavior, params};

use colecta_core::record::Capture;
use colecta_core::store::RecordStore;
use colecta_core::table::{RecordId, Table, TableName};

use crate::encode::{decode_record, encode_record};
use crate::schema::{SCHEMA, SCHEMA_VERSION};
use crate::seed::{self, SeedRows};
use crate::{Error, Result};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Colecta document store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone, Debug)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

/// What the migration step found when it ran.
enum MigrateOutcome {
  /// Stored version already current; nothing touched.
  Current,
  /// Stored version is ahead of this build.
  Newer(i64),
  /// Migrated from `from`, carrying `restored` capture rows across.
  Migrated { from: i64, restored: usize, skipped: usize },
}

impl SqliteStore {
  /// Open (or create) a store at `path`, applying pragmas and migrating
  /// to the current schema version before returning.
  ///
  /// Safe to call repeatedly and from racing contexts: migration runs in
  /// one exclusive transaction and re-checks the stored version inside
  /// it, so a lost race degenerates to a no-op.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(|e| Error::StorageUnavailable(e.to_string()))?;
    Self::from_connection(conn).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(|e| Error::StorageUnavailable(e.to_string()))?;
    Self::from_connection(conn).await
  }

  pub(crate) async fn from_connection(
    conn: tokio_rusqlite::Connection,
  ) -> Result<Self> {
    let store = Self { conn };
    store.apply_pragmas().await?;
    store.init_schema().await?;
    Ok(store)
  }

  async fn apply_pragmas(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(
          "PRAGMA journal_mode = WAL;
           PRAGMA synchronous = NORMAL;
           PRAGMA foreign_keys = ON;",
        )?;
        Ok(())
      })
      .await
      .map_err(|e| Error::StorageUnavailable(e.to_string()))
  }

  /// Migrate to [`SCHEMA_VERSION`] if the stored version is older.
  ///
  /// Drops and recreates all four tables and their indexes, reseeds the
  /// master set, and stamps the version — all in one exclusive
  /// transaction, so no reader ever observes a partial migration.
  /// Existing capture rows that still deserialise are carried across;
  /// synthetic demo captures are generated only when none were.
  pub(crate) async fn init_schema(&self) -> Result<()> {
    let seed = seed::build_seed_rows()?;

    let outcome = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Exclusive)?;

        let version: i64 =
          tx.query_row("SELECT * FROM pragma_user_version", [], |r| r.get(0))?;
        if version == SCHEMA_VERSION as i64 {
          return Ok(MigrateOutcome::Current);
        }
        if version > SCHEMA_VERSION as i64 {
          return Ok(MigrateOutcome::Newer(version));
        }

        let (preserved, skipped) = preserved_captures(&tx)?;

        for table in TableName::ALL {
          tx.execute_batch(&format!("DROP TABLE IF EXISTS {table}"))?;
        }
        tx.execute_batch(SCHEMA)?;

        upsert_masters(&tx, &seed)?;
        if preserved.is_empty() {
          insert_captures(&tx, &seed.captures)?;
        } else {
          for (id, data) in &preserved {
            tx.execute(
              "INSERT INTO captures (id, data) VALUES (?1, ?2)",
              params![id, data],
            )?;
          }
        }

        tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        tx.commit()?;

        Ok(MigrateOutcome::Migrated {
          from:     version,
          restored: preserved.len(),
          skipped,
        })
      })
      .await
      .map_err(|e| Error::StorageUnavailable(e.to_string()))?;

    match outcome {
      MigrateOutcome::Current => Ok(()),
      MigrateOutcome::Newer(found) => {
        Err(Error::VersionTooNew { found, supported: SCHEMA_VERSION })
      }
      MigrateOutcome::Migrated { from, restored, skipped } => {
        if skipped > 0 {
          tracing::warn!(skipped, "dropped captures that no longer decode");
        }
        tracing::info!(
          from,
          to = SCHEMA_VERSION,
          restored,
          "store migrated and seeded"
        );
        Ok(())
      }
    }
  }

  /// Stored schema version, from `PRAGMA user_version`.
  pub async fn schema_version(&self) -> Result<u32> {
    let version: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT * FROM pragma_user_version", [], |r| {
          r.get(0)
        })?)
      })
      .await?;
    Ok(version as u32)
  }

  /// Number of records in `table`.
  pub async fn count(&self, table: TableName) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!("SELECT COUNT(*) FROM {table}"),
          [],
          |r| r.get(0),
        )?)
      })
      .await
      .map_err(|e| map_db_err(table, e))?;
    Ok(n as u64)
  }

  async fn upsert<T: Table>(&self, record: T) -> Result<RecordId> {
    let table = T::TABLE;
    let data = encode_record(&record)?;
    let id = self
      .conn
      .call(move |conn| match record.id() {
        Some(id) => {
          conn.execute(
            &format!(
              "INSERT INTO {table} (id, data) VALUES (?1, ?2)
               ON CONFLICT(id) DO UPDATE SET data = excluded.data"
            ),
            params![id, data],
          )?;
          Ok(id)
        }
        None => {
          conn.execute(
            &format!("INSERT INTO {table} (data) VALUES (?1)"),
            params![data],
          )?;
          Ok(conn.last_insert_rowid())
        }
      })
      .await
      .map_err(|e| map_db_err(table, e))?;
    Ok(id)
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn add<T: Table>(&self, record: T) -> Result<RecordId> {
    let table = T::TABLE;
    let data = encode_record(&record)?;
    let explicit = record.id();
    let id = self
      .conn
      .call(move |conn| match explicit {
        Some(id) => {
          conn.execute(
            &format!("INSERT INTO {table} (id, data) VALUES (?1, ?2)"),
            params![id, data],
          )?;
          Ok(id)
        }
        None => {
          conn.execute(
            &format!("INSERT INTO {table} (data) VALUES (?1)"),
            params![data],
          )?;
          Ok(conn.last_insert_rowid())
        }
      })
      .await
      .map_err(|e| map_db_err(table, e))?;
    Ok(id)
  }

  async fn put<T: Table>(&self, record: T) -> Result<RecordId> {
    self.upsert(record).await
  }

  async fn get_all<T: Table>(&self) -> Result<Vec<T>> {
    let table = T::TABLE;
    let rows: Vec<(RecordId, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT id, data FROM {table}"))?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(|e| map_db_err(table, e))?;

    rows
      .into_iter()
      .map(|(id, data)| decode_record(id, &data))
      .collect()
  }

  async fn get_by_id<T: Table>(&self, id: RecordId) -> Result<Option<T>> {
    let table = T::TABLE;
    let row: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT data FROM {table} WHERE id = ?1"),
              params![id],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await
      .map_err(|e| map_db_err(table, e))?;

    row.map(|data| decode_record(id, &data)).transpose()
  }

  async fn update<T: Table>(&self, record: T) -> Result<RecordId> {
    if record.id().is_none() {
      return Err(colecta_core::Error::MissingId.into());
    }
    self.upsert(record).await
  }

  async fn ensure_seeded(&self) -> Result<()> {
    let seed = seed::build_seed_rows()?;
    let master_len = seed.indicators.len() as i64;

    let healed = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Exclusive)?;

        let indicators: i64 =
          tx.query_row("SELECT COUNT(*) FROM indicators", [], |r| r.get(0))?;
        let captures: i64 =
          tx.query_row("SELECT COUNT(*) FROM captures", [], |r| r.get(0))?;

        if indicators == master_len && captures > 0 {
          return Ok(None);
        }

        upsert_masters(&tx, &seed)?;
        if captures == 0 {
          insert_captures(&tx, &seed.captures)?;
        }
        tx.commit()?;

        Ok(Some((indicators, captures)))
      })
      .await?;

    if let Some((indicators, captures)) = healed {
      tracing::warn!(
        indicators,
        captures,
        expected = master_len,
        "seed verification failed; master set re-seeded"
      );
    }
    Ok(())
  }

  async fn reset(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        for table in TableName::ALL {
          tx.execute_batch(&format!("DROP TABLE IF EXISTS {table}"))?;
        }
        tx.pragma_update(None, "user_version", 0)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    tracing::warn!("store reset: all tables dropped; reopen to reinitialise");
    Ok(())
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Map unique-index failures to [`Error::ConstraintViolation`]; everything
/// else stays a database error.
fn map_db_err(table: TableName, e: tokio_rusqlite::Error) -> Error {
  match &e {
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      err,
      msg,
    )) if err.code == rusqlite::ErrorCode::ConstraintViolation => {
      Error::ConstraintViolation {
        table,
        detail: msg
          .clone()
          .unwrap_or_else(|| "unique index conflict".to_owned()),
      }
    }
    _ => Error::Database(e),
  }
}

/// Capture rows from the pre-migration schema that still decode into the
/// current record shape. Returns `(kept, skipped)`.
fn preserved_captures(
  tx: &rusqlite::Transaction<'_>,
) -> rusqlite::Result<(Vec<(RecordId, String)>, usize)> {
  let has_table: bool = tx.query_row(
    "SELECT EXISTS(
       SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'captures'
     )",
    [],
    |r| r.get(0),
  )?;
  if !has_table {
    return Ok((Vec::new(), 0));
  }

  // A legacy layout without a data column is unreadable; treat as empty.
  let Ok(mut stmt) = tx.prepare("SELECT id, data FROM captures") else {
    return Ok((Vec::new(), 0));
  };
  let rows = stmt
    .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let total = rows.len();
  let kept: Vec<(RecordId, String)> = rows
    .into_iter()
    .filter(|(_, data)| serde_json::from_str::<Capture>(data).is_ok())
    .collect();
  let skipped = total - kept.len();
  Ok((kept, skipped))
}

fn upsert_masters(
  tx: &rusqlite::Transaction<'_>,
  seed: &SeedRows,
) -> rusqlite::Result<()> {
  let groups: [(&str, &Vec<(RecordId, String)>); 3] = [
    ("users", &seed.users),
    ("projects", &seed.projects),
    ("indicators", &seed.indicators),
  ];
  for (table, rows) in groups {
    for (id, data) in rows.iter() {
      tx.execute(
        &format!(
          "INSERT INTO {table} (id, data) VALUES (?1, ?2)
           ON CONFLICT(id) DO UPDATE SET data = excluded.data"
        ),
        params![id, data],
      )?;
    }
  }
  Ok(())
}

fn insert_captures(
  tx: &rusqlite::Transaction<'_>,
  rows: &[String],
) -> rusqlite::Result<()> {
  for data in rows {
    tx.execute("INSERT INTO captures (data) VALUES (?1)", params![data])?;
  }
  Ok(())
}
