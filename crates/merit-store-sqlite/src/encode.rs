//! Conversions between domain types and the text stored in SQLite columns.
//!
//! Timestamps are `YYYY-MM-DD HH:MM` strings so that `ORDER BY timestamp`
//! is chronological. Categories are their lowercase names.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime};
use merit_core::record::{PointRecord, PointType, TIMESTAMP_FORMAT};

use crate::{Error, Result};

/// Formats found in files migrated from a legacy `time` column.
const LEGACY_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

// ─── Timestamp ───────────────────────────────────────────────────────────────

pub fn encode_ts(dt: NaiveDateTime) -> String { dt.format(TIMESTAMP_FORMAT).to_string() }

pub fn decode_ts(s: &str) -> Result<NaiveDateTime> {
  let s = s.trim();
  std::iter::once(TIMESTAMP_FORMAT)
    .chain(LEGACY_TIMESTAMP_FORMATS.iter().copied())
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
    .ok_or_else(|| Error::DateParse(format!("unrecognised timestamp: {s:?}")))
}

// ─── PointType ───────────────────────────────────────────────────────────────

pub fn encode_point_type(t: PointType) -> &'static str { t.into() }

pub fn decode_point_type(s: &str) -> Result<PointType> {
  PointType::from_str(s).map_err(|_| Error::UnknownPointType(s.to_owned()))
}

// ─── Row type ────────────────────────────────────────────────────────────────

/// Values read directly from a `records` row. `point_type` and `timestamp`
/// are nullable on tables upgraded from older layouts.
pub struct RawRecord {
  pub id:         i64,
  pub student_id: String,
  pub name:       String,
  pub reason:     String,
  pub points:     i64,
  pub point_type: Option<String>,
  pub timestamp:  Option<String>,
}

impl RawRecord {
  pub const COLUMNS: &'static str = "id, student_id, name, reason, points, point_type, timestamp";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      student_id: row.get(1)?,
      name:       row.get(2)?,
      reason:     row.get(3)?,
      points:     row.get(4)?,
      point_type: row.get(5)?,
      timestamp:  row.get(6)?,
    })
  }

  pub fn into_record(self) -> Result<PointRecord> {
    let point_type = match self.point_type.as_deref() {
      Some(s) => decode_point_type(s)?,
      None if self.points < 0 => PointType::Demerit,
      None => PointType::Merit,
    };

    let timestamp = self
      .timestamp
      .as_deref()
      .ok_or_else(|| Error::DateParse(format!("record {} has no timestamp", self.id)))
      .and_then(decode_ts)?;

    Ok(PointRecord {
      id: self.id,
      student_id: self.student_id,
      name: self.name,
      reason: self.reason,
      points: self.points,
      point_type,
      timestamp,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  #[test]
  fn timestamp_roundtrip_and_legacy_formats() {
    let dt = NaiveDate::from_ymd_opt(2023, 11, 2)
      .unwrap()
      .and_hms_opt(14, 5, 0)
      .unwrap();
    assert_eq!(encode_ts(dt), "2023-11-02 14:05");
    assert_eq!(decode_ts("2023-11-02 14:05").unwrap(), dt);
    assert_eq!(decode_ts("2023-11-02 14:05:00").unwrap(), dt);
    assert_eq!(decode_ts("2023-11-02T14:05:00").unwrap(), dt);
    assert!(matches!(decode_ts("yesterday"), Err(Error::DateParse(_))));
  }

  #[test]
  fn point_type_strings() {
    assert_eq!(encode_point_type(PointType::Offset), "offset");
    assert_eq!(decode_point_type("demerit").unwrap(), PointType::Demerit);
    assert!(matches!(decode_point_type("상점"), Err(Error::UnknownPointType(_))));
  }
}
