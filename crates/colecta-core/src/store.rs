//! The `RecordStore` trait — the CRUD contract of the document store.
//!
//! The trait is implemented by storage backends (e.g.
//! `colecta-store-sqlite`). Collaborators (session handling, the CLI)
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::table::{RecordId, Table};

/// Abstraction over the versioned, indexed document store.
///
/// Lookup by id models absence as `None`, never as an error. Unique-index
/// conflicts and storage failures are carried by the backend's error type.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert a new record, assigning the next id when the record carries
  /// none. Fails on unique-index conflicts (e.g. duplicate user email).
  fn add<T: Table>(
    &self,
    record: T,
  ) -> impl Future<Output = Result<RecordId, Self::Error>> + Send + '_;

  /// Upsert by id — insert if absent, full replace if present. The
  /// seeding primitive: re-putting the same id never duplicates.
  fn put<T: Table>(
    &self,
    record: T,
  ) -> impl Future<Output = Result<RecordId, Self::Error>> + Send + '_;

  /// Every record in the table. Order is unspecified; callers must not
  /// depend on it.
  fn get_all<T: Table>(
    &self,
  ) -> impl Future<Output = Result<Vec<T>, Self::Error>> + Send + '_;

  /// Lookup by id. Absent records are `None`.
  fn get_by_id<T: Table>(
    &self,
    id: RecordId,
  ) -> impl Future<Output = Result<Option<T>, Self::Error>> + Send + '_;

  /// Full replace of an existing record by id. Same semantics as
  /// [`RecordStore::put`] for CRUD callers.
  fn update<T: Table>(
    &self,
    record: T,
  ) -> impl Future<Output = Result<RecordId, Self::Error>> + Send + '_;

  /// Verification pass: confirm the master seed set is intact and the
  /// captures table is non-empty, re-running the seed step in one
  /// transaction if not. Call before any workflow that depends on
  /// indicator data being present.
  fn ensure_seeded(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Irrecoverably delete the entire store. The handle must be reopened
  /// to reinitialise from scratch.
  fn reset(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
