//! Error type for `colecta-store-sqlite`.

use colecta_core::table::TableName;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The underlying engine could not be opened. Fatal to the calling
  /// workflow; surfaced, never retried silently.
  #[error("storage unavailable: {0}")]
  StorageUnavailable(String),

  /// The on-disk store was written by a newer build. No forward
  /// migration exists; clobbering it would destroy data.
  #[error("stored schema version {found} is newer than supported version {supported}")]
  VersionTooNew { found: i64, supported: u32 },

  /// A unique secondary index rejected a write (e.g. duplicate
  /// `users.email`). Recoverable; surfaced to the caller for correction.
  #[error("unique constraint violated on table {table}: {detail}")]
  ConstraintViolation { table: TableName, detail: String },

  #[error("core error: {0}")]
  Core(#[from] colecta_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
