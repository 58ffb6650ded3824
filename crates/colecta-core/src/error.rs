//! Error types for `colecta-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown table name: {0:?}")]
  UnknownTable(String),

  #[error("unknown axis: {0:?}")]
  UnknownAxis(String),

  /// An operation that requires a store-assigned id was given a record
  /// without one.
  #[error("record has no id assigned")]
  MissingId,

  #[error("password hash error: {0}")]
  PasswordHash(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
