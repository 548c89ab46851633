//! Backup-then-wipe.
//!
//! The store's wipe is unconditional. This module is the only caller of
//! [`RecordStore::wipe_all`] in the application and refuses to reach it
//! unless a backup was written first.

use std::path::{Path, PathBuf};

use crate::store::RecordStore;

/// What a completed reset did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetOutcome {
  pub backup_path: PathBuf,
  pub deleted:     u64,
}

/// Back the store up into `backup_dir`, then delete every record.
///
/// If the backup fails its error is returned and nothing is deleted.
pub async fn backup_then_wipe<S: RecordStore>(
  store: &S,
  backup_dir: &Path,
) -> Result<ResetOutcome, S::Error> {
  let backup_path = match store.backup_to(backup_dir).await {
    Ok(path) => path,
    Err(e) => {
      tracing::error!(error = %e, dir = %backup_dir.display(), "backup failed; wipe aborted");
      return Err(e);
    }
  };

  let deleted = store.wipe_all().await?;
  tracing::info!(deleted, backup = %backup_path.display(), "all records wiped");

  Ok(ResetOutcome { backup_path, deleted })
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;
  use crate::{
    record::{NewRecord, PointRecord, PointType},
    store::RecordQuery,
  };

  #[derive(Debug, thiserror::Error)]
  #[error("mock store: {0}")]
  struct MockError(&'static str);

  /// Vec-backed store whose backup can be made to fail.
  struct MockStore {
    records:     Mutex<Vec<PointRecord>>,
    fail_backup: bool,
  }

  impl MockStore {
    fn with_records(n: usize, fail_backup: bool) -> Self {
      let records = (1..=n as i64)
        .map(|id| {
          let new = NewRecord::new("S1", "Kim", "Helped", id, PointType::Merit).unwrap();
          PointRecord {
            id,
            student_id: new.student_id,
            name: new.name,
            reason: new.reason,
            points: new.points,
            point_type: new.point_type,
            timestamp: new.timestamp,
          }
        })
        .collect();
      Self { records: Mutex::new(records), fail_backup }
    }
  }

  impl RecordStore for MockStore {
    type Error = MockError;

    async fn insert(&self, _: NewRecord) -> Result<PointRecord, MockError> {
      Err(MockError("read-only"))
    }

    async fn query_all(&self, _: RecordQuery) -> Result<Vec<PointRecord>, MockError> {
      Ok(self.records.lock().unwrap().clone())
    }

    async fn count(&self) -> Result<u64, MockError> {
      Ok(self.records.lock().unwrap().len() as u64)
    }

    async fn wipe_all(&self) -> Result<u64, MockError> {
      let mut records = self.records.lock().unwrap();
      let n = records.len() as u64;
      records.clear();
      Ok(n)
    }

    async fn backup_to(&self, dir: &Path) -> Result<PathBuf, MockError> {
      if self.fail_backup {
        Err(MockError("disk full"))
      } else {
        Ok(dir.join("backup_20240301_080000.db"))
      }
    }
  }

  #[tokio::test]
  async fn wipes_after_successful_backup() {
    let store = MockStore::with_records(3, false);
    let outcome = backup_then_wipe(&store, Path::new("backups")).await.unwrap();

    assert_eq!(outcome.deleted, 3);
    assert_eq!(outcome.backup_path, Path::new("backups/backup_20240301_080000.db"));
    assert_eq!(store.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn failed_backup_deletes_nothing() {
    let store = MockStore::with_records(3, true);
    let err = backup_then_wipe(&store, Path::new("backups")).await.unwrap_err();

    assert_eq!(err.0, "disk full");
    assert_eq!(store.count().await.unwrap(), 3);
  }
}
