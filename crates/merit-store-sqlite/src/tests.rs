//! Integration tests for `SqliteStore` against in-memory and on-disk
//! databases.

use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use merit_core::{
  record::{NewRecord, PointType, Signed, StudentKey},
  reset::backup_then_wipe,
  store::{Direction, RecordQuery, RecordStore},
  view::{detail_view, drill_down, summary_view, SearchTerm},
  ValidationError,
};
use tempfile::TempDir;

use crate::{schema, Error, SqliteStore, LATEST_VERSION};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn at(minutes: i64) -> NaiveDateTime {
  NaiveDate::from_ymd_opt(2024, 3, 1)
    .unwrap()
    .and_hms_opt(8, 0, 0)
    .unwrap()
    + Duration::minutes(minutes)
}

fn record(sid: &str, name: &str, reason: &str, points: i64, t: PointType, minute: i64) -> NewRecord {
  NewRecord::new(sid, name, reason, points, t).unwrap().at(at(minute))
}

/// Write a table in a pre-migration layout straight through rusqlite.
fn seed_legacy(path: &Path, ddl: &str) {
  let conn = rusqlite::Connection::open(path).unwrap();
  conn.execute_batch(ddl).unwrap();
}

fn column_names(path: &Path) -> Vec<String> {
  let conn = rusqlite::Connection::open(path).unwrap();
  let mut cols: Vec<String> = schema::columns(&conn, "records").unwrap().into_iter().collect();
  cols.sort();
  cols
}

// ─── Writes ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_assigns_ids_and_keeps_sign() {
  let s = store().await;

  let merit = s.insert(record("S1", "Kim", "Helped clean", 5, PointType::Merit, 0)).await.unwrap();
  let demerit = s.insert(record("S1", "Kim", "Late", 3, PointType::Demerit, 1)).await.unwrap();
  let offset = s.insert(record("S1", "Kim", "Volunteered", 2, PointType::Offset, 2)).await.unwrap();

  assert!(merit.id < demerit.id && demerit.id < offset.id);

  let stored = s.query_all(RecordQuery::all()).await.unwrap();
  assert_eq!(stored.len(), 3);
  for r in &stored {
    assert_eq!(r.points.signum(), r.point_type.sign());
  }
  let late = stored.iter().find(|r| r.reason == "Late").unwrap();
  assert_eq!(late.points, -3);
  assert_eq!(late.magnitude(), 3);
  assert_eq!(late.timestamp, at(1));
}

#[tokio::test]
async fn invalid_record_is_not_written() {
  let s = store().await;

  let mut bad = record("S1", "Kim", "Late", 3, PointType::Demerit, 0);
  bad.points = 3;
  assert!(matches!(
    s.insert(bad).await,
    Err(Error::Validation(ValidationError::SignMismatch { .. }))
  ));

  let mut blank = record("S1", "Kim", "Late", 3, PointType::Demerit, 0);
  blank.name = "  ".into();
  assert!(matches!(
    s.insert(blank).await,
    Err(Error::Validation(ValidationError::EmptyField("name")))
  ));

  assert_eq!(s.count().await.unwrap(), 0);
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn query_orders_by_timestamp_then_insertion() {
  let s = store().await;
  s.insert(record("S1", "Kim", "first", 1, PointType::Merit, 5)).await.unwrap();
  s.insert(record("S2", "Lee", "oldest", 1, PointType::Merit, 0)).await.unwrap();
  s.insert(record("S3", "Park", "second", 1, PointType::Merit, 5)).await.unwrap();

  let newest_first: Vec<_> = s
    .query_all(RecordQuery::all())
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.reason)
    .collect();
  assert_eq!(newest_first, ["second", "first", "oldest"]);

  let oldest_first: Vec<_> = s
    .query_all(RecordQuery { direction: Direction::Ascending, ..RecordQuery::all() })
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.reason)
    .collect();
  assert_eq!(oldest_first, ["oldest", "first", "second"]);
}

#[tokio::test]
async fn query_is_a_fresh_snapshot() {
  let s = store().await;
  s.insert(record("S1", "Kim", "a", 1, PointType::Merit, 0)).await.unwrap();
  let first = s.query_all(RecordQuery::all()).await.unwrap();

  s.insert(record("S1", "Kim", "b", 1, PointType::Merit, 1)).await.unwrap();
  let second = s.query_all(RecordQuery::all()).await.unwrap();

  assert_eq!(first.len(), 1);
  assert_eq!(second.len(), 2);
}

#[tokio::test]
async fn student_query_uses_id_and_name() {
  let s = store().await;
  s.insert(record("S1", "Kim", "a", 1, PointType::Merit, 0)).await.unwrap();
  s.insert(record("S1", "Kimberly", "b", 2, PointType::Merit, 1)).await.unwrap();
  s.insert(record("S1", "Kim", "c", 3, PointType::Demerit, 2)).await.unwrap();

  let kim = s
    .query_all(RecordQuery::student(StudentKey::new("S1", "Kim")))
    .await
    .unwrap();
  let reasons: Vec<_> = kim.iter().map(|r| r.reason.as_str()).collect();
  assert_eq!(reasons, ["c", "a"]);
}

// ─── Views ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn summary_scenario_over_sqlite() {
  let s = store().await;
  s.insert(record("S1", "Kim", "Helped clean", 5, PointType::Merit, 0)).await.unwrap();
  s.insert(record("S1", "Kim", "Late", 3, PointType::Demerit, 1)).await.unwrap();
  s.insert(record("S2", "Lee", "Tardy", 1, PointType::Demerit, 2)).await.unwrap();

  let rows = summary_view(&s, &SearchTerm::default()).await.unwrap();
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[0].key, StudentKey::new("S2", "Lee"));

  let kim = &rows[1];
  assert_eq!(kim.merit_total, 5);
  assert_eq!(kim.demerit_total, 3);
  assert_eq!(Signed(kim.net_total).to_string(), "+2");
  assert_eq!(kim.last_activity, at(1));
}

#[tokio::test]
async fn search_and_drill_down() {
  let s = store().await;
  s.insert(record("S1", "Kim", "Helped clean", 5, PointType::Merit, 0)).await.unwrap();
  s.insert(record("S2", "Lee", "Late for class", 1, PointType::Demerit, 1)).await.unwrap();

  let hits = summary_view(&s, &SearchTerm::new("kim")).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].key.name, "Kim");

  // Reason text only matches in the detail view.
  assert!(summary_view(&s, &SearchTerm::new("class")).await.unwrap().is_empty());
  let detail = detail_view(&s, &SearchTerm::new("CLASS")).await.unwrap();
  assert_eq!(detail.len(), 1);
  assert_eq!(detail[0].student_id, "S2");

  let all = detail_view(&s, &SearchTerm::new("")).await.unwrap();
  assert_eq!(all, s.query_all(RecordQuery::all()).await.unwrap());

  let history = drill_down(&s, &StudentKey::new("S1", "Kim")).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(Signed(history[0].points).to_string(), "+5");
}

// ─── Migrations ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_store_is_at_latest_version() {
  let s = store().await;
  assert_eq!(s.schema_version().await.unwrap(), LATEST_VERSION);
}

#[tokio::test]
async fn initialize_is_idempotent() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("data.db");

  let s = SqliteStore::open(&path).await.unwrap();
  s.insert(record("S1", "Kim", "Helped", 5, PointType::Merit, 0)).await.unwrap();
  let before = s.query_all(RecordQuery::all()).await.unwrap();

  s.initialize().await.unwrap();
  s.initialize().await.unwrap();
  assert_eq!(s.schema_version().await.unwrap(), LATEST_VERSION);
  assert_eq!(s.query_all(RecordQuery::all()).await.unwrap(), before);
  s.close().await.unwrap();

  let cols = column_names(&path);
  let reopened = SqliteStore::open(&path).await.unwrap();
  assert_eq!(reopened.query_all(RecordQuery::all()).await.unwrap(), before);
  reopened.close().await.unwrap();
  assert_eq!(column_names(&path), cols);
  assert_eq!(cols, ["id", "name", "point_type", "points", "reason", "student_id", "timestamp"]);
}

#[tokio::test]
async fn legacy_table_gains_category_and_timestamp() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("data.db");
  seed_legacy(
    &path,
    "CREATE TABLE records (
       id INTEGER PRIMARY KEY AUTOINCREMENT,
       student_id TEXT NOT NULL,
       name TEXT NOT NULL,
       reason TEXT NOT NULL,
       points INTEGER NOT NULL,
       time TEXT NOT NULL
     );
     INSERT INTO records (student_id, name, reason, points, time)
       VALUES ('S1', 'Kim', 'Helped', 5, '2023-09-01 10:00'),
              ('S1', 'Kim', 'Late', -3, '2023-09-02 08:30');",
  );

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.schema_version().await.unwrap(), LATEST_VERSION);

  let rows = s.query_all(RecordQuery::all()).await.unwrap();
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[0].reason, "Late");
  assert_eq!(rows[0].point_type, PointType::Demerit);
  assert_eq!(rows[1].point_type, PointType::Merit);
  assert_eq!(
    rows[0].timestamp,
    NaiveDate::from_ymd_opt(2023, 9, 2).unwrap().and_hms_opt(8, 30, 0).unwrap(),
  );

  // New writes land next to the migrated rows.
  s.insert(record("S1", "Kim", "Tidy desk", 1, PointType::Offset, 0)).await.unwrap();
  assert_eq!(s.count().await.unwrap(), 3);
  s.close().await.unwrap();

  let cols = column_names(&path);
  assert!(cols.contains(&"time".to_string()), "legacy column must survive");
  assert!(cols.contains(&"timestamp".to_string()));

  // A reopened legacy file still accepts writes, and both time columns agree.
  let s = SqliteStore::open(&path).await.unwrap();
  s.insert(record("S2", "Lee", "Late", 2, PointType::Demerit, 30)).await.unwrap();
  assert_eq!(s.count().await.unwrap(), 4);
  s.close().await.unwrap();

  let conn = rusqlite::Connection::open(&path).unwrap();
  let (time, timestamp): (String, String) = conn
    .query_row(
      "SELECT time, timestamp FROM records WHERE student_id = 'S2'",
      [],
      |r| Ok((r.get(0)?, r.get(1)?)),
    )
    .unwrap();
  assert_eq!(time, "2024-03-01 08:30");
  assert_eq!(time, timestamp);
}

#[tokio::test]
async fn negative_rows_under_default_merit_label_become_demerits() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("data.db");
  // The category column was added with a merit default, so older negative
  // rows carry the merit label.
  seed_legacy(
    &path,
    "CREATE TABLE records (
       id INTEGER PRIMARY KEY AUTOINCREMENT,
       student_id TEXT NOT NULL,
       name TEXT NOT NULL,
       reason TEXT NOT NULL,
       points INTEGER NOT NULL,
       timestamp TEXT NOT NULL
     );
     INSERT INTO records (student_id, name, reason, points, timestamp)
       VALUES ('S1', 'Kim', 'Helped', 5, '2023-09-01 10:00'),
              ('S1', 'Kim', 'Late', -3, '2023-09-02 08:30');
     ALTER TABLE records ADD COLUMN point_type TEXT DEFAULT '상점';",
  );

  let s = SqliteStore::open(&path).await.unwrap();
  let late = s
    .query_all(RecordQuery::all())
    .await
    .unwrap()
    .into_iter()
    .find(|r| r.reason == "Late")
    .unwrap();
  assert_eq!(late.point_type, PointType::Demerit);
  assert_eq!(late.points, -3);

  let rows = summary_view(&s, &SearchTerm::default()).await.unwrap();
  assert_eq!(rows[0].merit_total, 5);
  assert_eq!(rows[0].demerit_total, 3);
  assert_eq!(rows[0].net_total, 2);
}

#[tokio::test]
async fn undecodable_rows_do_not_hide_the_rest() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("data.db");
  seed_legacy(
    &path,
    "CREATE TABLE records (
       id INTEGER PRIMARY KEY AUTOINCREMENT,
       student_id TEXT NOT NULL,
       name TEXT NOT NULL,
       reason TEXT NOT NULL,
       points INTEGER NOT NULL,
       time TEXT
     );
     INSERT INTO records (student_id, name, reason, points, time)
       VALUES ('S1', 'Kim', 'Helped', 5, '2023-09-01 10:00'),
              ('S1', 'Kim', 'Lost', 2, NULL),
              ('S2', 'Lee', 'Smudged', 1, 'last tuesday');",
  );

  let s = SqliteStore::open(&path).await.unwrap();
  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn
      .execute(
        "INSERT INTO records (student_id, name, reason, points, point_type, timestamp, time)
         VALUES ('S3', 'Park', 'Odd', 1, 'bonus', '2023-09-03 09:00', '2023-09-03 09:00')",
        [],
      )
      .unwrap();
  }

  let detail = detail_view(&s, &SearchTerm::default()).await.unwrap();
  assert_eq!(detail.len(), 1);
  assert_eq!(detail[0].reason, "Helped");

  let rows = summary_view(&s, &SearchTerm::default()).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].merit_total, 5);

  let history = drill_down(&s, &StudentKey::new("S1", "Kim")).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(s.count().await.unwrap(), 4, "skipped rows stay in the file");
}

#[tokio::test]
async fn korean_labels_are_normalized() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("data.db");
  seed_legacy(
    &path,
    "CREATE TABLE records (
       id INTEGER PRIMARY KEY AUTOINCREMENT,
       student_id TEXT NOT NULL,
       name TEXT NOT NULL,
       reason TEXT NOT NULL,
       points INTEGER NOT NULL,
       point_type TEXT NOT NULL DEFAULT '상점',
       timestamp TEXT NOT NULL
     );
     INSERT INTO records (student_id, name, reason, points, point_type, timestamp)
       VALUES ('S1', 'Kim', 'a', 5,  '상점',   '2023-09-01 10:00'),
              ('S1', 'Kim', 'b', -2, '벌점',   '2023-09-01 11:00'),
              ('S1', 'Kim', 'c', 1,  '상쇄점', '2023-09-01 12:00');",
  );

  let s = SqliteStore::open(&path).await.unwrap();
  let types: Vec<_> = s
    .query_all(RecordQuery::all())
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.point_type)
    .collect();
  assert_eq!(types, [PointType::Offset, PointType::Demerit, PointType::Merit]);
}

#[tokio::test]
async fn newer_schema_is_refused() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("data.db");
  seed_legacy(&path, "PRAGMA user_version = 99;");

  assert!(matches!(
    SqliteStore::open(&path).await,
    Err(Error::UnsupportedSchemaVersion { found: 99, .. })
  ));
}

// ─── Backup and wipe ─────────────────────────────────────────────────────────

#[tokio::test]
async fn backup_is_a_full_copy() {
  let dir = TempDir::new().unwrap();
  let s = SqliteStore::open(dir.path().join("data.db")).await.unwrap();
  s.insert(record("S1", "Kim", "Helped", 5, PointType::Merit, 0)).await.unwrap();
  s.insert(record("S2", "Lee", "Late", 1, PointType::Demerit, 1)).await.unwrap();

  let backups = dir.path().join("backups");
  let first = s.backup_to(&backups).await.unwrap();
  let second = s.backup_to(&backups).await.unwrap();
  assert_ne!(first, second);

  let file_name = first.file_name().unwrap().to_string_lossy().into_owned();
  assert!(file_name.starts_with("backup_") && file_name.ends_with(".db"), "{file_name}");

  let copy = SqliteStore::open(&first).await.unwrap();
  assert_eq!(copy.count().await.unwrap(), 2);
  assert_eq!(
    copy.query_all(RecordQuery::all()).await.unwrap(),
    s.query_all(RecordQuery::all()).await.unwrap(),
  );
}

#[tokio::test]
async fn reset_wipes_after_backup() {
  let dir = TempDir::new().unwrap();
  let s = store().await;
  s.insert(record("S1", "Kim", "Helped", 5, PointType::Merit, 0)).await.unwrap();
  s.insert(record("S1", "Kim", "Late", 1, PointType::Demerit, 1)).await.unwrap();

  let outcome = backup_then_wipe(&s, &dir.path().join("backups")).await.unwrap();
  assert_eq!(outcome.deleted, 2);
  assert!(outcome.backup_path.exists());
  assert_eq!(s.count().await.unwrap(), 0);

  let copy = SqliteStore::open(&outcome.backup_path).await.unwrap();
  assert_eq!(copy.count().await.unwrap(), 2);
}

#[tokio::test]
async fn failed_backup_keeps_every_record() {
  let dir = TempDir::new().unwrap();
  // A plain file where the backup directory should go.
  let blocked = dir.path().join("backups");
  std::fs::write(&blocked, b"not a directory").unwrap();

  let s = store().await;
  s.insert(record("S1", "Kim", "Helped", 5, PointType::Merit, 0)).await.unwrap();

  let err = backup_then_wipe(&s, &blocked).await.unwrap_err();
  assert!(matches!(err, Error::Backup { .. }), "{err}");
  assert_eq!(s.count().await.unwrap(), 1);
}

#[tokio::test]
async fn wipe_alone_is_unconditional() {
  let s = store().await;
  s.insert(record("S1", "Kim", "Helped", 5, PointType::Merit, 0)).await.unwrap();
  assert_eq!(s.wipe_all().await.unwrap(), 1);
  assert_eq!(s.wipe_all().await.unwrap(), 0);
}
