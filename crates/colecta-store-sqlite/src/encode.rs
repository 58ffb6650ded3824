//! Encoding and decoding between record types and the JSON documents
//! stored in the `data` column.
//!
//! The id never lives inside the document — it is stripped on write and
//! injected from the id column on read, so the column stays the single
//! source of truth.

use colecta_core::table::{RecordId, Table};

use crate::Result;

/// Serialise a record to its document form, with the `id` key removed.
pub fn encode_record<T: Table>(record: &T) -> Result<String> {
  let mut value = serde_json::to_value(record)?;
  if let Some(map) = value.as_object_mut() {
    map.remove("id");
  }
  Ok(value.to_string())
}

/// Rebuild a record from an id column value and its document.
pub fn decode_record<T: Table>(id: RecordId, data: &str) -> Result<T> {
  let mut record: T = serde_json::from_str(data)?;
  record.set_id(id);
  Ok(record)
}
