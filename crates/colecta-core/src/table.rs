//! The [`Table`] abstraction — what a record type must provide so the
//! generic CRUD surface can store it.

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result};

/// Store-assigned record identifier. Immutable once assigned and
/// monotonically issued per table.
pub type RecordId = i64;

/// The four record tables the store owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableName {
  Users,
  Projects,
  Indicators,
  Captures,
}

impl TableName {
  pub const ALL: [TableName; 4] = [
    TableName::Users,
    TableName::Projects,
    TableName::Indicators,
    TableName::Captures,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      TableName::Users => "users",
      TableName::Projects => "projects",
      TableName::Indicators => "indicators",
      TableName::Captures => "captures",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "users" => Ok(TableName::Users),
      "projects" => Ok(TableName::Projects),
      "indicators" => Ok(TableName::Indicators),
      "captures" => Ok(TableName::Captures),
      other => Err(Error::UnknownTable(other.to_owned())),
    }
  }
}

impl std::fmt::Display for TableName {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A record type persisted in one of the store's tables.
///
/// Records serialise to JSON documents. The `id` field is carried in a
/// dedicated column, not inside the document, so implementors expose it
/// here for the store to strip on write and inject on read.
pub trait Table:
  Clone + Send + Sync + Serialize + DeserializeOwned + 'static
{
  const TABLE: TableName;

  /// `None` until the store assigns an id.
  fn id(&self) -> Option<RecordId>;

  fn set_id(&mut self, id: RecordId);
}
