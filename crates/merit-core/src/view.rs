//! Summary and detail views over stored records, with free-text search.
//!
//! Both views are derived from a full, unfiltered [`RecordStore::query_all`]
//! snapshot every time they are requested; a search never refines an earlier
//! result.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{
  record::{PointRecord, PointType, StudentKey},
  store::{RecordQuery, RecordStore},
};

// ─── Search ──────────────────────────────────────────────────────────────────

/// A case-insensitive substring filter. Empty terms match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerm(String);

impl SearchTerm {
  pub fn new(raw: &str) -> Self { Self(raw.trim().to_lowercase()) }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  fn hit(&self, field: &str) -> bool { field.to_lowercase().contains(&self.0) }

  /// Summary rows match on student id or name.
  pub fn matches_identity(&self, record: &PointRecord) -> bool {
    self.is_empty() || self.hit(&record.student_id) || self.hit(&record.name)
  }

  /// Detail rows additionally match on the reason.
  pub fn matches_detail(&self, record: &PointRecord) -> bool {
    self.matches_identity(record) || self.hit(&record.reason)
  }
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Per-student rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
  pub key:           StudentKey,
  pub merit_total:   i64,
  /// Magnitude: demerits are stored negative but reported positive here.
  pub demerit_total: i64,
  pub offset_total:  i64,
  /// Signed sum of every record in the group.
  pub net_total:     i64,
  pub last_activity: NaiveDateTime,
  pub record_count:  usize,
  /// Highest record id in the group; breaks `last_activity` ties.
  #[serde(skip)]
  latest_id:         i64,
}

impl StudentSummary {
  fn start(record: &PointRecord) -> Self {
    Self {
      key:           record.key(),
      merit_total:   0,
      demerit_total: 0,
      offset_total:  0,
      net_total:     0,
      last_activity: record.timestamp,
      record_count:  0,
      latest_id:     record.id,
    }
  }

  fn add(&mut self, record: &PointRecord) {
    match record.point_type {
      PointType::Merit => self.merit_total += record.points,
      PointType::Demerit => self.demerit_total += record.points.abs(),
      PointType::Offset => self.offset_total += record.points,
    }
    self.net_total += record.points;
    self.record_count += 1;
    self.last_activity = self.last_activity.max(record.timestamp);
    self.latest_id = self.latest_id.max(record.id);
  }
}

/// Group records by `(student_id, name)`, most recently active first.
pub fn summarize(records: &[PointRecord]) -> Vec<StudentSummary> {
  let mut groups: HashMap<StudentKey, StudentSummary> = HashMap::new();
  for record in records {
    groups
      .entry(record.key())
      .or_insert_with(|| StudentSummary::start(record))
      .add(record);
  }

  let mut rows: Vec<StudentSummary> = groups.into_values().collect();
  rows.sort_by(|a, b| {
    b.last_activity
      .cmp(&a.last_activity)
      .then(b.latest_id.cmp(&a.latest_id))
  });
  rows
}

// ─── Views ───────────────────────────────────────────────────────────────────

/// Which table the shell is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
  #[default]
  Summary,
  Detail,
}

impl ViewMode {
  pub fn toggle(self) -> Self {
    match self {
      Self::Summary => Self::Detail,
      Self::Detail => Self::Summary,
    }
  }
}

/// A computed view, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
  Summary(Vec<StudentSummary>),
  Detail(Vec<PointRecord>),
}

impl View {
  pub fn mode(&self) -> ViewMode {
    match self {
      Self::Summary(_) => ViewMode::Summary,
      Self::Detail(_) => ViewMode::Detail,
    }
  }

  pub fn len(&self) -> usize {
    match self {
      Self::Summary(rows) => rows.len(),
      Self::Detail(rows) => rows.len(),
    }
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Per-student rollup of every record whose id or name contains `term`.
pub async fn summary_view<S: RecordStore>(
  store: &S,
  term: &SearchTerm,
) -> Result<Vec<StudentSummary>, S::Error> {
  let records = store.query_all(RecordQuery::all()).await?;
  let matching: Vec<PointRecord> = records
    .into_iter()
    .filter(|r| term.matches_identity(r))
    .collect();
  Ok(summarize(&matching))
}

/// Every record whose id, name or reason contains `term`, newest first.
pub async fn detail_view<S: RecordStore>(
  store: &S,
  term: &SearchTerm,
) -> Result<Vec<PointRecord>, S::Error> {
  let mut records = store.query_all(RecordQuery::all()).await?;
  records.retain(|r| term.matches_detail(r));
  Ok(records)
}

pub async fn load_view<S: RecordStore>(
  store: &S,
  mode: ViewMode,
  term: &SearchTerm,
) -> Result<View, S::Error> {
  Ok(match mode {
    ViewMode::Summary => View::Summary(summary_view(store, term).await?),
    ViewMode::Detail => View::Detail(detail_view(store, term).await?),
  })
}

/// Full history of one student identity, newest first.
///
/// Keyed on the same `(student_id, name)` pair as the summary, so the
/// drill-down always agrees with the row it was opened from.
pub async fn drill_down<S: RecordStore>(
  store: &S,
  key: &StudentKey,
) -> Result<Vec<PointRecord>, S::Error> {
  store.query_all(RecordQuery::student(key.clone())).await
}
