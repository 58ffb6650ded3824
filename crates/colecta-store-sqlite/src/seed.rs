//! Pre-encoded seed rows, built outside the database thread.
//!
//! Everything random or fallible (argon2 hashing, JSON encoding, the
//! synthetic generator) happens here so the migration closure is pure
//! SQL.

use chrono::Utc;
use colecta_core::seed::{
  SEED_PASSWORD, master_indicators, master_project, master_users,
  synthetic_captures,
};
use colecta_core::table::RecordId;
use colecta_core::{Error as CoreError, auth, table::Table};
use rand_core::OsRng;

use crate::encode::encode_record;
use crate::Result;

/// Rows ready to insert: `(id, document)` for master records, bare
/// documents for synthetic captures (ids are store-assigned).
pub(crate) struct SeedRows {
  pub users:      Vec<(RecordId, String)>,
  pub projects:   Vec<(RecordId, String)>,
  pub indicators: Vec<(RecordId, String)>,
  pub captures:   Vec<String>,
}

pub(crate) fn build_seed_rows() -> Result<SeedRows> {
  let hash = auth::hash_password(SEED_PASSWORD)?;

  let users = encode_master(master_users(&hash))?;
  let projects = encode_master(vec![master_project()])?;
  let indicators = encode_master(master_indicators())?;

  let mut rng = OsRng;
  let captures = synthetic_captures(&mut rng, &master_indicators(), Utc::now())
    .iter()
    .map(encode_record)
    .collect::<Result<Vec<_>>>()?;

  Ok(SeedRows { users, projects, indicators, captures })
}

fn encode_master<T: Table>(records: Vec<T>) -> Result<Vec<(RecordId, String)>> {
  records
    .iter()
    .map(|r| {
      let id = r.id().ok_or(CoreError::MissingId)?;
      Ok((id, encode_record(r)?))
    })
    .collect()
}
