//! The `RecordStore` trait and its query type.
//!
//! Implemented by storage backends (e.g. `merit-store-sqlite`). The view
//! engine, the reset flow and the TUI are written against this trait only.

use std::{future::Future, path::{Path, PathBuf}};

use crate::record::{NewRecord, PointRecord, StudentKey};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Sort direction on the record timestamp. Ties fall back to insertion order
/// in the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
  Ascending,
  /// Newest first.
  #[default]
  Descending,
}

/// Parameters for [`RecordStore::query_all`].
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
  /// Restrict to one `(student_id, name)` identity.
  pub student:   Option<StudentKey>,
  pub direction: Direction,
}

impl RecordQuery {
  /// Every record, newest first.
  pub fn all() -> Self { Self::default() }

  pub fn student(key: StudentKey) -> Self {
    Self { student: Some(key), ..Self::default() }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Durable storage for point records.
///
/// Records are append-only: there is no update and no per-record delete. The
/// only destructive operation is [`RecordStore::wipe_all`], which callers
/// must precede with [`RecordStore::backup_to`] (see
/// [`crate::reset::backup_then_wipe`]). The store itself does not enforce
/// that ordering.
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Validate and append one record; returns it with its assigned id.
  fn insert(
    &self,
    record: NewRecord,
  ) -> impl Future<Output = Result<PointRecord, Self::Error>> + Send + '_;

  /// A fresh snapshot of the matching records in timestamp order. Calling it
  /// again re-reads current state.
  fn query_all(
    &self,
    query: RecordQuery,
  ) -> impl Future<Output = Result<Vec<PointRecord>, Self::Error>> + Send + '_;

  /// Number of stored records.
  fn count(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Delete every record in one statement. Returns the number removed.
  fn wipe_all(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Write a timestamped full copy of the store into `dir` and return its
  /// path.
  fn backup_to<'a>(
    &'a self,
    dir: &'a Path,
  ) -> impl Future<Output = Result<PathBuf, Self::Error>> + Send + 'a;
}
