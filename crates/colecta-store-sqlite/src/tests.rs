//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::Utc;
use colecta_core::axis::Axis;
use colecta_core::record::{
  Capture, CapturePayload, CaptureStatus, Indicator, Project, Role,
  SyncStatus, User,
};
use colecta_core::seed::SYNTHETIC_CAPTURE_COUNT;
use colecta_core::store::RecordStore;
use colecta_core::table::{Table, TableName};
use rusqlite::params;

use crate::encode::encode_record;
use crate::{Error, SCHEMA_VERSION, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn user(email: &str) -> User {
  User {
    id:            None,
    email:         email.into(),
    name:          "Test User".into(),
    password_hash: "$argon2id$v=19$test".into(),
    role:          Role::FieldTechnician,
  }
}

fn capture(indicator_id: i64, axis: Axis) -> Capture {
  Capture {
    id: None,
    indicator_id,
    indicator_name: "Retention Rate".into(),
    axis,
    captured_at: Utc::now(),
    status: CaptureStatus::Draft,
    sync_status: SyncStatus::Pending,
    payload: CapturePayload::Count { total: 12 },
    location: None,
  }
}

// ─── Open and seed ───────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_open_seeds_master_set() {
  let s = store().await;

  assert_eq!(s.schema_version().await.unwrap(), SCHEMA_VERSION);

  let users: Vec<User> = s.get_all().await.unwrap();
  let projects: Vec<Project> = s.get_all().await.unwrap();
  let indicators: Vec<Indicator> = s.get_all().await.unwrap();
  let captures: Vec<Capture> = s.get_all().await.unwrap();

  assert_eq!(users.len(), 2);
  assert_eq!(projects.len(), 1);
  assert_eq!(indicators.len(), 9);
  assert_eq!(captures.len(), SYNTHETIC_CAPTURE_COUNT);

  // Master records keep their pre-assigned ids and canonical values.
  let admin = s.get_by_id::<User>(1).await.unwrap().unwrap();
  assert_eq!(admin.email, "admin@colecta.org");
  assert_eq!(admin.role, Role::Administrator);

  let project = s.get_by_id::<Project>(1).await.unwrap().unwrap();
  assert!(project.active);
  assert_eq!(project.global_target, 100);
}

#[tokio::test]
async fn seeded_captures_satisfy_invariants() {
  let s = store().await;
  let indicators: Vec<Indicator> = s.get_all().await.unwrap();
  let captures: Vec<Capture> = s.get_all().await.unwrap();

  for c in &captures {
    let indicator = indicators
      .iter()
      .find(|i| i.id == Some(c.indicator_id))
      .expect("capture references a seeded indicator");
    assert_eq!(indicator.axis, c.axis);

    if c.sync_status == SyncStatus::Synced {
      assert_eq!(c.status, CaptureStatus::Approved);
    }
  }
}

#[tokio::test]
async fn ensure_seeded_is_idempotent() {
  let s = store().await;

  s.ensure_seeded().await.unwrap();
  s.ensure_seeded().await.unwrap();

  assert_eq!(s.count(TableName::Users).await.unwrap(), 2);
  assert_eq!(s.count(TableName::Indicators).await.unwrap(), 9);
  assert_eq!(
    s.count(TableName::Captures).await.unwrap(),
    SYNTHETIC_CAPTURE_COUNT as u64
  );
}

#[tokio::test]
async fn ensure_seeded_heals_missing_indicators() {
  let s = store().await;

  // Simulate a partially-completed earlier session.
  s.conn
    .call(|conn| {
      conn.execute("DELETE FROM indicators WHERE id > 4", [])?;
      Ok(())
    })
    .await
    .unwrap();

  s.ensure_seeded().await.unwrap();

  let indicators: Vec<Indicator> = s.get_all().await.unwrap();
  assert_eq!(indicators.len(), 9);
  // User-entered captures survive the healing pass.
  let captures: Vec<Capture> = s.get_all().await.unwrap();
  assert_eq!(captures.len(), SYNTHETIC_CAPTURE_COUNT);
}

// ─── CRUD ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_assigns_monotonic_ids() {
  let s = store().await;

  let first = s.add(user("a@example.org")).await.unwrap();
  let second = s.add(user("b@example.org")).await.unwrap();

  // Seeded users occupy ids 1-2; new ids keep climbing.
  assert!(first >= 3);
  assert_eq!(second, first + 1);
}

#[tokio::test]
async fn duplicate_email_is_a_constraint_violation() {
  let s = store().await;

  s.add(user("x@y.z")).await.unwrap();
  let err = s.add(user("x@y.z")).await.unwrap_err();
  assert!(matches!(
    err,
    Error::ConstraintViolation { table: TableName::Users, .. }
  ));

  // The failed insert corrupted nothing.
  let users: Vec<User> = s.get_all().await.unwrap();
  assert_eq!(users.iter().filter(|u| u.email == "x@y.z").count(), 1);
}

#[tokio::test]
async fn get_by_id_missing_returns_none() {
  let s = store().await;
  let found: Option<User> = s.get_by_id(9999).await.unwrap();
  assert!(found.is_none());
}

#[tokio::test]
async fn put_is_an_upsert() {
  let s = store().await;

  let mut u = user("upsert@example.org");
  let id = s.put(u.clone()).await.unwrap();

  u.set_id(id);
  u.name = "Renamed".into();
  let id_again = s.put(u).await.unwrap();
  assert_eq!(id, id_again);

  let users: Vec<User> = s.get_all().await.unwrap();
  let stored: Vec<_> =
    users.iter().filter(|u| u.email == "upsert@example.org").collect();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].name, "Renamed");
}

#[tokio::test]
async fn update_replaces_by_id() {
  let s = store().await;

  let mut c = capture(7, Axis::SportsExcellence);
  let id = s.add(c.clone()).await.unwrap();

  c.set_id(id);
  c.status = CaptureStatus::Approved;
  s.update(c).await.unwrap();

  let stored: Capture = s.get_by_id(id).await.unwrap().unwrap();
  assert_eq!(stored.status, CaptureStatus::Approved);
  assert_eq!(stored.sync_status, SyncStatus::Pending);
}

#[tokio::test]
async fn update_without_id_is_rejected() {
  let s = store().await;
  let err = s.update(user("no-id@example.org")).await.unwrap_err();
  assert!(matches!(err, Error::Core(colecta_core::Error::MissingId)));
}

// ─── Migration ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn migration_from_older_version_preserves_captures() {
  let conn = tokio_rusqlite::Connection::open_in_memory().await.unwrap();

  let keep = encode_record(&capture(7, Axis::SportsExcellence)).unwrap();
  conn
    .call(move |conn| {
      conn.execute_batch(
        "CREATE TABLE captures (
           id   INTEGER PRIMARY KEY AUTOINCREMENT,
           data TEXT NOT NULL
         );",
      )?;
      conn.execute(
        "INSERT INTO captures (id, data) VALUES (41, ?1)",
        params![keep],
      )?;
      // A row from a long-dead schema generation; silently dropped.
      conn.execute(
        "INSERT INTO captures (id, data) VALUES (42, '{\"legacy\":true}')",
        [],
      )?;
      conn.pragma_update(None, "user_version", 7)?;
      Ok(())
    })
    .await
    .unwrap();

  let s = SqliteStore::from_connection(conn).await.unwrap();

  assert_eq!(s.schema_version().await.unwrap(), SCHEMA_VERSION);

  // Master set reseeded, preserved capture carried over with its id,
  // no synthetic top-up because the table was non-empty.
  let indicators: Vec<Indicator> = s.get_all().await.unwrap();
  assert_eq!(indicators.len(), 9);
  let captures: Vec<Capture> = s.get_all().await.unwrap();
  assert_eq!(captures.len(), 1);
  assert_eq!(captures[0].id, Some(41));
}

#[tokio::test]
async fn migration_rebuilds_all_tables_and_indexes() {
  let conn = tokio_rusqlite::Connection::open_in_memory().await.unwrap();
  conn
    .call(|conn| {
      // Old generation with a different users layout and no other tables.
      conn.execute_batch(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT);",
      )?;
      conn.pragma_update(None, "user_version", 3)?;
      Ok(())
    })
    .await
    .unwrap();

  let s = SqliteStore::from_connection(conn).await.unwrap();

  // Post-migration schema is exactly the current one: unique email index
  // active, all four tables present and seeded.
  let err = s.add(user("admin@colecta.org")).await.unwrap_err();
  assert!(matches!(err, Error::ConstraintViolation { .. }));

  let captures: Vec<Capture> = s.get_all().await.unwrap();
  assert_eq!(captures.len(), SYNTHETIC_CAPTURE_COUNT);
}

#[tokio::test]
async fn newer_stored_version_is_refused() {
  let conn = tokio_rusqlite::Connection::open_in_memory().await.unwrap();
  conn
    .call(|conn| {
      conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)?;
      Ok(())
    })
    .await
    .unwrap();

  let err = SqliteStore::from_connection(conn).await.unwrap_err();
  assert!(matches!(err, Error::VersionTooNew { .. }));
}

// ─── Reset ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reset_drops_everything_and_reopen_reseeds() {
  let s = store().await;
  s.add(user("about-to-vanish@example.org")).await.unwrap();

  s.reset().await.unwrap();

  // The handle is unusable until reinitialised.
  assert!(s.get_all::<User>().await.is_err());
  assert_eq!(s.schema_version().await.unwrap(), 0);

  // Reopening runs the full migration and reseeds from scratch.
  s.init_schema().await.unwrap();
  let users: Vec<User> = s.get_all().await.unwrap();
  assert_eq!(users.len(), 2);
  assert!(users.iter().all(|u| u.email != "about-to-vanish@example.org"));
}
