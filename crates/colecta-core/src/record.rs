//! Record types — the four document tables of the field-data store.
//!
//! Every record carries an `Option<RecordId>` that the store fills in on
//! insert; all other fields are plain serde-serialisable data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::axis::Axis;
use crate::table::{RecordId, Table, TableName};

// ─── Users ───────────────────────────────────────────────────────────────────

/// What a user is allowed to see and do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Administrator,
  ProjectCoordinator,
  FieldTechnician,
}

impl Role {
  pub fn label(self) -> &'static str {
    match self {
      Role::Administrator => "Administrator",
      Role::ProjectCoordinator => "Project Coordinator",
      Role::FieldTechnician => "Field Technician",
    }
  }
}

/// An application user. `email` is unique across the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:            Option<RecordId>,
  pub email:         String,
  pub name:          String,
  /// Argon2 PHC string; plaintext is never stored.
  pub password_hash: String,
  pub role:          Role,
}

impl Table for User {
  const TABLE: TableName = TableName::Users;

  fn id(&self) -> Option<RecordId> { self.id }

  fn set_id(&mut self, id: RecordId) { self.id = Some(id); }
}

// ─── Projects ────────────────────────────────────────────────────────────────

/// A programme under which indicators are tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:            Option<RecordId>,
  pub name:          String,
  /// Free-text theme; a project may span all three indicator axes.
  pub axis:          String,
  pub global_target: u32,
  pub active:        bool,
  pub description:   String,
}

impl Table for Project {
  const TABLE: TableName = TableName::Projects;

  fn id(&self) -> Option<RecordId> { self.id }

  fn set_id(&mut self, id: RecordId) { self.id = Some(id); }
}

// ─── Indicators ──────────────────────────────────────────────────────────────

/// A measurable indicator within a project, filed under one axis.
/// Indexed by `project_id` and by `axis`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:         Option<RecordId>,
  pub project_id: RecordId,
  pub axis:       Axis,
  pub name:       String,
  /// Target description, e.g. "85% annual retention".
  pub target:     String,
}

impl Table for Indicator {
  const TABLE: TableName = TableName::Indicators;

  fn id(&self) -> Option<RecordId> { self.id }

  fn set_id(&mut self, id: RecordId) { self.id = Some(id); }
}

// ─── Captures ────────────────────────────────────────────────────────────────

/// Review state of a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
  Draft,
  Approved,
  Rejected,
}

/// Whether a capture has been reconciled with a remote system.
/// Placeholder state only — no sync engine exists in this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
  Pending,
  Synced,
}

/// The measured value of a capture. The variant tag is stored inside the
/// JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CapturePayload {
  /// A counted total, e.g. attendance.
  Count { total: u32 },
  /// Individual participant scores on a small scale.
  Participants { scores: Vec<u8> },
}

/// A point on the map where a capture was taken.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
  pub lat: f64,
  pub lng: f64,
}

/// A field data capture against one indicator.
///
/// `indicator_name` and `axis` are denormalised from the indicator at
/// capture time so records render offline without a join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capture {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:             Option<RecordId>,
  pub indicator_id:   RecordId,
  pub indicator_name: String,
  pub axis:           Axis,
  pub captured_at:    DateTime<Utc>,
  pub status:         CaptureStatus,
  pub sync_status:    SyncStatus,
  pub payload:        CapturePayload,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub location:       Option<GeoPoint>,
}

impl Table for Capture {
  const TABLE: TableName = TableName::Captures;

  fn id(&self) -> Option<RecordId> { self.id }

  fn set_id(&mut self, id: RecordId) { self.id = Some(id); }
}
