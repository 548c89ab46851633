//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use merit_core::{
  record::{NewRecord, PointRecord},
  store::{Direction, RecordQuery, RecordStore},
};

use crate::{
  encode::{encode_point_type, encode_ts, RawRecord},
  schema::{self, LATEST_VERSION},
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A merit ledger backed by a single SQLite file.
///
/// Cloning is cheap. The inner connection is reference-counted and every
/// clone talks to the same background thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn:        tokio_rusqlite::Connection,
  /// The file still has the pre-migration `time TEXT NOT NULL` column, which
  /// every insert must fill too.
  legacy_time: bool,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and bring its schema up to date.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self::start(conn).await?;
    tracing::info!(path = %path.display(), legacy_time = store.legacy_time, "record store opened");
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::start(conn).await
  }

  async fn start(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let mut store = Self { conn, legacy_time: false };
    store.initialize().await?;
    store.legacy_time = store
      .conn
      .call(|conn| Ok(schema::columns(conn, "records")?.contains("time")))
      .await?;
    Ok(store)
  }

  /// Run any pending migrations. Safe to call on every startup; a store that
  /// is already current is left untouched.
  pub async fn initialize(&self) -> Result<()> {
    let found = self.schema_version().await?;
    if found > LATEST_VERSION {
      return Err(Error::UnsupportedSchemaVersion { found, supported: LATEST_VERSION });
    }

    let applied = self
      .conn
      .call(|conn| Ok(schema::apply_pending(conn)?))
      .await?;

    for migration in applied {
      tracing::info!(version = migration.version, name = migration.name, "applied migration");
    }
    Ok(())
  }

  /// The `user_version` marker of the underlying file.
  pub async fn schema_version(&self) -> Result<i64> {
    let version = self
      .conn
      .call(|conn| Ok(schema::user_version(conn)?))
      .await?;
    Ok(version)
  }

  /// Close the connection, flushing anything SQLite still holds.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    tracing::debug!("record store closed");
    Ok(())
  }
}

/// `backup_<YYYYMMDD_HHMMSS>.db` inside `dir`, with a numeric suffix if two
/// backups land in the same second.
fn backup_path(dir: &Path, now: DateTime<Local>) -> PathBuf {
  let stamp = now.format("%Y%m%d_%H%M%S");
  let first = dir.join(format!("backup_{stamp}.db"));
  if !first.exists() {
    return first;
  }
  (1..)
    .map(|n| dir.join(format!("backup_{stamp}_{n}.db")))
    .find(|p| !p.exists())
    .unwrap_or(first)
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn insert(&self, record: NewRecord) -> Result<PointRecord> {
    record.validate()?;

    let student_id     = record.student_id.clone();
    let name           = record.name.clone();
    let reason         = record.reason.clone();
    let points         = record.points;
    let point_type_str = encode_point_type(record.point_type);
    let timestamp_str  = encode_ts(record.timestamp);

    let sql = if self.legacy_time {
      "INSERT INTO records (student_id, name, reason, points, point_type, timestamp, time)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)"
    } else {
      "INSERT INTO records (student_id, name, reason, points, point_type, timestamp)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
    };

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          sql,
          rusqlite::params![student_id, name, reason, points, point_type_str, timestamp_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    tracing::debug!(id, student_id = %record.student_id, points, "record inserted");

    Ok(PointRecord {
      id,
      student_id: record.student_id,
      name:       record.name,
      reason:     record.reason,
      points:     record.points,
      point_type: record.point_type,
      timestamp:  record.timestamp,
    })
  }

  async fn query_all(&self, query: RecordQuery) -> Result<Vec<PointRecord>> {
    let order = match query.direction {
      Direction::Ascending => "ASC",
      Direction::Descending => "DESC",
    };

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let (where_clause, params) = match query.student {
          Some(key) => ("WHERE student_id = ?1 AND name = ?2", vec![key.student_id, key.name]),
          None => ("", Vec::new()),
        };

        let sql = format!(
          "SELECT {cols} FROM records
           {where_clause}
           ORDER BY timestamp {order}, id {order}",
          cols = RawRecord::COLUMNS,
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    // A row that cannot be decoded is left in the file but kept out of views.
    let records = raws
      .into_iter()
      .filter_map(|raw| {
        let id = raw.id;
        raw
          .into_record()
          .inspect_err(|e| tracing::warn!(id, error = %e, "skipping undecodable record"))
          .ok()
      })
      .collect();
    Ok(records)
  }

  async fn count(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM records", [], |r| r.get(0))?))
      .await?;
    Ok(n as u64)
  }

  async fn wipe_all(&self) -> Result<u64> {
    let deleted = self
      .conn
      .call(|conn| Ok(conn.execute("DELETE FROM records", [])?))
      .await?;
    Ok(deleted as u64)
  }

  async fn backup_to(&self, dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
      .await
      .map_err(|source| Error::Backup { path: dir.to_path_buf(), source })?;

    let path = backup_path(dir, Local::now());
    let target = path.to_string_lossy().into_owned();

    // VACUUM INTO writes a consistent copy even while the connection is open.
    self
      .conn
      .call(move |conn| {
        conn.execute("VACUUM INTO ?1", [target])?;
        Ok(())
      })
      .await?;

    tokio::fs::metadata(&path)
      .await
      .map_err(|source| Error::Backup { path: path.clone(), source })?;

    tracing::info!(path = %path.display(), "backup written");
    Ok(path)
  }
}
