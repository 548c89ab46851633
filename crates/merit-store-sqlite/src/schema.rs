//! Schema and migrations for the merit SQLite store.
//!
//! Migrations are an ordered list gated on `PRAGMA user_version`: every step
//! newer than the stored version runs in its own transaction, which also
//! bumps the version. Steps probe the live columns before altering anything,
//! so a file written before the version marker existed (version 0, with a
//! `records` table of some older shape) is upgraded in place.
//!
//! Migrations only ever add. No column or row is dropped.

use std::collections::HashSet;

use rusqlite::Connection;

pub struct Migration {
  pub version: i64,
  pub name:    &'static str,
  apply:       fn(&Connection) -> rusqlite::Result<()>,
}

pub const MIGRATIONS: &[Migration] = &[
  Migration { version: 1, name: "create_records", apply: create_records },
  Migration { version: 2, name: "add_point_type", apply: add_point_type },
  Migration { version: 3, name: "add_timestamp", apply: add_timestamp },
  Migration {
    version: 4,
    name:    "normalize_point_type_labels",
    apply:   normalize_point_type_labels,
  },
];

/// The version a fully migrated store reports.
pub const LATEST_VERSION: i64 = 4;

// ─── Steps ───────────────────────────────────────────────────────────────────

fn create_records(conn: &Connection) -> rusqlite::Result<()> {
  conn.execute_batch(
    "
CREATE TABLE IF NOT EXISTS records (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id  TEXT    NOT NULL,
    name        TEXT    NOT NULL,
    reason      TEXT    NOT NULL,
    points      INTEGER NOT NULL,   -- signed; negative only for demerits
    point_type  TEXT    NOT NULL DEFAULT 'merit',
    timestamp   TEXT    NOT NULL    -- 'YYYY-MM-DD HH:MM', local time
);

CREATE INDEX IF NOT EXISTS records_student_idx ON records(student_id, name);
",
  )
}

/// Older files have no category column. The sign is the only evidence left:
/// negative rows become demerits, everything else merit. Offset rows from
/// that era cannot be told apart from merit and are not guessed at.
fn add_point_type(conn: &Connection) -> rusqlite::Result<()> {
  if columns(conn, "records")?.contains("point_type") {
    return Ok(());
  }
  conn.execute_batch(
    "
ALTER TABLE records ADD COLUMN point_type TEXT DEFAULT 'merit';
UPDATE records
   SET point_type = CASE WHEN points < 0 THEN 'demerit' ELSE 'merit' END;
",
  )
}

/// The creation time used to live in a column called `time`.
fn add_timestamp(conn: &Connection) -> rusqlite::Result<()> {
  let cols = columns(conn, "records")?;
  if cols.contains("timestamp") || !cols.contains("time") {
    return Ok(());
  }
  conn.execute_batch(
    "
ALTER TABLE records ADD COLUMN timestamp TEXT;
UPDATE records SET timestamp = time WHERE timestamp IS NULL;
",
  )
}

/// Older files may carry Korean category labels. Their column defaulted to
/// the merit label, so negative rows can be labelled merit; the sign wins.
fn normalize_point_type_labels(conn: &Connection) -> rusqlite::Result<()> {
  conn.execute_batch(
    "
UPDATE records
   SET point_type = CASE point_type
                      WHEN '상점'   THEN 'merit'
                      WHEN '벌점'   THEN 'demerit'
                      WHEN '상쇄점' THEN 'offset'
                    END
 WHERE point_type IN ('상점', '벌점', '상쇄점');

UPDATE records
   SET point_type = CASE WHEN points < 0 THEN 'demerit' ELSE 'merit' END
 WHERE point_type IS NULL;

UPDATE records SET point_type = 'demerit' WHERE points < 0 AND point_type = 'merit';
",
  )
}

// ─── Runner ──────────────────────────────────────────────────────────────────

pub fn user_version(conn: &Connection) -> rusqlite::Result<i64> {
  conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// Column names of `table`; empty if the table does not exist.
pub fn columns(conn: &Connection, table: &str) -> rusqlite::Result<HashSet<String>> {
  let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
  let names = stmt
    .query_map([table], |row| row.get::<_, String>(0))?
    .collect::<rusqlite::Result<HashSet<_>>>()?;
  Ok(names)
}

/// Apply every step newer than the stored version. Returns the steps that
/// ran, oldest first.
pub fn apply_pending(conn: &mut Connection) -> rusqlite::Result<Vec<&'static Migration>> {
  let current = user_version(conn)?;
  let mut applied = Vec::new();

  for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
    let tx = conn.transaction()?;
    (migration.apply)(&*tx)?;
    tx.pragma_update(None, "user_version", migration.version)?;
    tx.commit()?;
    applied.push(migration);
  }

  Ok(applied)
}
