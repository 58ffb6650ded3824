//! The three thematic axes every indicator and capture belongs to.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A closed set: the monitoring framework defines exactly three axes, and
/// every indicator is filed under one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
  /// Women's empowerment and leadership.
  FemaleLeadership,
  /// Peacebuilding and territory.
  PeaceTerritory,
  /// Sports retention and excellence.
  SportsExcellence,
}

impl Axis {
  pub const ALL: [Axis; 3] = [
    Axis::FemaleLeadership,
    Axis::PeaceTerritory,
    Axis::SportsExcellence,
  ];

  /// The stable string stored in the database and used by indexes.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn as_str(self) -> &'static str {
    match self {
      Axis::FemaleLeadership => "female_leadership",
      Axis::PeaceTerritory => "peace_territory",
      Axis::SportsExcellence => "sports_excellence",
    }
  }

  /// Human-readable label for reports and the CLI.
  pub fn label(self) -> &'static str {
    match self {
      Axis::FemaleLeadership => "Women's Empowerment and Leadership",
      Axis::PeaceTerritory => "Peacebuilding and Territory",
      Axis::SportsExcellence => "Sports Retention and Excellence",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "female_leadership" => Ok(Axis::FemaleLeadership),
      "peace_territory" => Ok(Axis::PeaceTerritory),
      "sports_excellence" => Ok(Axis::SportsExcellence),
      other => Err(Error::UnknownAxis(other.to_owned())),
    }
  }
}

impl std::fmt::Display for Axis {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}
