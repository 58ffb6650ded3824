//! The process-wide session slot.
//!
//! Login reads `users` through the store's CRUD contract, verifies the
//! password, and persists a reduced non-sensitive record to a file:
//! created at login, read by every later invocation, destroyed at
//! logout. The slot is opaque to the store.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use colecta_core::auth;
use colecta_core::record::{Role, User};
use colecta_core::table::RecordId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("invalid credentials")]
  InvalidCredentials,

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

/// What survives into the session file. Never the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
  pub user_id:      RecordId,
  pub name:         String,
  pub role:         Role,
  pub email:        String,
  pub logged_in_at: DateTime<Utc>,
}

/// Match `email` against the user table and verify the password.
pub fn authenticate(
  users: &[User],
  email: &str,
  password: &str,
) -> Result<Session, SessionError> {
  let user = users
    .iter()
    .find(|u| u.email == email)
    .ok_or(SessionError::InvalidCredentials)?;

  if !auth::verify_password(password, &user.password_hash) {
    return Err(SessionError::InvalidCredentials);
  }

  Ok(Session {
    user_id:      user.id.unwrap_or_default(),
    name:         user.name.clone(),
    role:         user.role,
    email:        user.email.clone(),
    logged_in_at: Utc::now(),
  })
}

pub fn save(session: &Session, path: &Path) -> Result<(), SessionError> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  fs::write(path, serde_json::to_vec_pretty(session)?)?;
  Ok(())
}

pub fn load(path: &Path) -> Result<Option<Session>, SessionError> {
  match fs::read(path) {
    Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
    Err(e) => Err(e.into()),
  }
}

/// Remove the session file. Returns whether one existed.
pub fn destroy(path: &Path) -> Result<bool, SessionError> {
  match fs::remove_file(path) {
    Ok(()) => Ok(true),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
    Err(e) => Err(e.into()),
  }
}
