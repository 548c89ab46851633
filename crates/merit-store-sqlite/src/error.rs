//! Error type for `merit-store-sqlite`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid record: {0}")]
  Validation(#[from] merit_core::ValidationError),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("backup to {path} failed: {source}")]
  Backup {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown point type in store: {0:?}")]
  UnknownPointType(String),

  /// The file was written by a newer build than this one.
  #[error("schema version {found} is newer than supported version {supported}")]
  UnsupportedSchemaVersion { found: i64, supported: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
