//! Point records, the single unit of data in the ledger.
//!
//! A record is an immutable event: a student earned or lost points for a
//! reason at a point in time. Records are never updated; the only way to
//! remove them is a full wipe (see [`crate::reset`]).

use std::fmt;

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{Result, ValidationError};

/// Display and storage format for timestamps. Minute resolution; sorts
/// lexicographically in chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

// ─── Category ────────────────────────────────────────────────────────────────

/// The three point categories.
///
/// The stored sign of a record's points follows from its category: merit and
/// offset are positive, demerit is negative.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PointType {
  Merit,
  Demerit,
  /// Counteracts demerits in the net total; tracked apart from merit.
  Offset,
}

impl PointType {
  /// `+1` for merit and offset, `-1` for demerit.
  pub fn sign(self) -> i64 {
    match self {
      Self::Merit | Self::Offset => 1,
      Self::Demerit => -1,
    }
  }

  /// Apply this category's sign to a positive magnitude.
  pub fn signed(self, magnitude: i64) -> i64 { self.sign() * magnitude }

  /// Title-case label for the UI.
  pub fn label(self) -> &'static str {
    match self {
      Self::Merit => "Merit",
      Self::Demerit => "Demerit",
      Self::Offset => "Offset",
    }
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// The `(student_id, name)` pair that the summary and drill-down views group
/// by. A student id reused under a different name is a different key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudentKey {
  pub student_id: String,
  pub name:       String,
}

impl StudentKey {
  pub fn new(student_id: impl Into<String>, name: impl Into<String>) -> Self {
    Self { student_id: student_id.into(), name: name.into() }
  }
}

impl fmt::Display for StudentKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({})", self.name, self.student_id)
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A persisted record, as read back from a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRecord {
  /// Store-assigned, monotonically increasing.
  pub id:         i64,
  pub student_id: String,
  pub name:       String,
  pub reason:     String,
  /// Signed; see [`PointType::sign`].
  pub points:     i64,
  pub point_type: PointType,
  pub timestamp:  NaiveDateTime,
}

impl PointRecord {
  pub fn key(&self) -> StudentKey { StudentKey::new(&self.student_id, &self.name) }

  pub fn belongs_to(&self, key: &StudentKey) -> bool {
    self.student_id == key.student_id && self.name == key.name
  }

  /// The positive magnitude originally entered.
  pub fn magnitude(&self) -> i64 { self.points.abs() }
}

/// A validated record that has not been written yet.
///
/// Build one with [`NewRecord::new`] or [`NewRecord::from_form`]; stores call
/// [`NewRecord::validate`] again before writing, so hand-assembled values are
/// checked too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
  pub student_id: String,
  pub name:       String,
  pub reason:     String,
  pub points:     i64,
  pub point_type: PointType,
  pub timestamp:  NaiveDateTime,
}

impl NewRecord {
  /// Trim the text fields, check them, and derive the stored sign from
  /// `point_type`. `magnitude` is what the user typed and must be positive.
  pub fn new(
    student_id: &str,
    name: &str,
    reason: &str,
    magnitude: i64,
    point_type: PointType,
  ) -> Result<Self> {
    let student_id = required("student id", student_id)?;
    let name = required("name", name)?;
    let reason = required("reason", reason)?;

    if magnitude <= 0 {
      return Err(ValidationError::NonPositivePoints(magnitude));
    }

    Ok(Self {
      student_id,
      name,
      reason,
      points: point_type.signed(magnitude),
      point_type,
      timestamp: current_minute(),
    })
  }

  /// Like [`NewRecord::new`], but parses the points field from raw input.
  pub fn from_form(
    student_id: &str,
    name: &str,
    points: &str,
    reason: &str,
    point_type: PointType,
  ) -> Result<Self> {
    let trimmed = points.trim();
    if trimmed.is_empty() {
      return Err(ValidationError::EmptyField("points"));
    }
    let magnitude: i64 = trimmed
      .parse()
      .map_err(|_| ValidationError::InvalidPoints(trimmed.to_owned()))?;
    Self::new(student_id, name, reason, magnitude, point_type)
  }

  /// Override the creation time; truncated to the minute.
  pub fn at(mut self, timestamp: NaiveDateTime) -> Self {
    self.timestamp = truncate_to_minute(timestamp);
    self
  }

  /// Check every invariant a stored record must satisfy.
  pub fn validate(&self) -> Result<()> {
    for (field, value) in [
      ("student id", &self.student_id),
      ("name", &self.name),
      ("reason", &self.reason),
    ] {
      if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
      }
    }

    if self.points == 0 || self.points.signum() != self.point_type.sign() {
      return Err(ValidationError::SignMismatch {
        points:     self.points,
        point_type: self.point_type,
      });
    }

    Ok(())
  }
}

fn required(field: &'static str, value: &str) -> Result<String> {
  let value = value.trim();
  if value.is_empty() {
    return Err(ValidationError::EmptyField(field));
  }
  Ok(value.to_owned())
}

// ─── Time ────────────────────────────────────────────────────────────────────

/// The current local time with seconds dropped.
pub fn current_minute() -> NaiveDateTime { truncate_to_minute(Local::now().naive_local()) }

pub fn truncate_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
  dt.date().and_hms_opt(dt.hour(), dt.minute(), 0).unwrap_or(dt)
}

// ─── Display ─────────────────────────────────────────────────────────────────

/// Points rendered with an explicit `+` when positive; zero and negative
/// values print as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signed(pub i64);

impl fmt::Display for Signed {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.0 > 0 {
      write!(f, "+{}", self.0)
    } else {
      write!(f, "{}", self.0)
    }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use chrono::NaiveDate;

  use super::*;

  #[test]
  fn sign_follows_category() {
    let merit = NewRecord::new("S1", "Kim", "Helped clean", 5, PointType::Merit).unwrap();
    let demerit = NewRecord::new("S1", "Kim", "Late", 3, PointType::Demerit).unwrap();
    let offset = NewRecord::new("S1", "Kim", "Volunteered", 2, PointType::Offset).unwrap();

    assert_eq!(merit.points, 5);
    assert_eq!(demerit.points, -3);
    assert_eq!(offset.points, 2);
  }

  #[test]
  fn text_fields_are_trimmed_and_required() {
    let rec = NewRecord::new("  S1 ", " Kim", "Late  ", 1, PointType::Demerit).unwrap();
    assert_eq!(rec.student_id, "S1");
    assert_eq!(rec.name, "Kim");
    assert_eq!(rec.reason, "Late");

    assert_eq!(
      NewRecord::new("S1", "   ", "Late", 1, PointType::Merit),
      Err(ValidationError::EmptyField("name")),
    );
    assert_eq!(
      NewRecord::new("S1", "Kim", "", 1, PointType::Merit),
      Err(ValidationError::EmptyField("reason")),
    );
  }

  #[test]
  fn magnitude_must_be_positive() {
    assert_eq!(
      NewRecord::new("S1", "Kim", "Late", 0, PointType::Demerit),
      Err(ValidationError::NonPositivePoints(0)),
    );
    assert_eq!(
      NewRecord::new("S1", "Kim", "Late", -4, PointType::Merit),
      Err(ValidationError::NonPositivePoints(-4)),
    );
  }

  #[test]
  fn form_rejects_non_numeric_points() {
    assert_eq!(
      NewRecord::from_form("S1", "Kim", "five", "Late", PointType::Merit),
      Err(ValidationError::InvalidPoints("five".into())),
    );
    assert_eq!(
      NewRecord::from_form("S1", "Kim", " ", "Late", PointType::Merit),
      Err(ValidationError::EmptyField("points")),
    );
    let rec = NewRecord::from_form("S1", "Kim", " 7 ", "Late", PointType::Demerit).unwrap();
    assert_eq!(rec.points, -7);
  }

  #[test]
  fn validate_catches_hand_built_sign_errors() {
    let mut rec = NewRecord::new("S1", "Kim", "Late", 3, PointType::Demerit).unwrap();
    rec.points = 3;
    assert!(matches!(rec.validate(), Err(ValidationError::SignMismatch { .. })));

    rec.points = 0;
    assert!(rec.validate().is_err());
  }

  #[test]
  fn timestamps_drop_seconds() {
    let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
      .unwrap()
      .and_hms_opt(9, 15, 42)
      .unwrap();
    let rec = NewRecord::new("S1", "Kim", "Late", 1, PointType::Demerit)
      .unwrap()
      .at(dt);
    assert_eq!(rec.timestamp.format(TIMESTAMP_FORMAT).to_string(), "2024-03-01 09:15");
    assert_eq!(rec.timestamp.second(), 0);
  }

  #[test]
  fn point_type_strings() {
    assert_eq!(PointType::Demerit.to_string(), "demerit");
    assert_eq!(PointType::from_str("Offset").unwrap(), PointType::Offset);
    assert!(PointType::from_str("bonus").is_err());
  }

  #[test]
  fn signed_display() {
    assert_eq!(Signed(2).to_string(), "+2");
    assert_eq!(Signed(0).to_string(), "0");
    assert_eq!(Signed(-3).to_string(), "-3");
  }
}
