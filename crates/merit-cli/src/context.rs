//! Application context: the store handle, the login gate and the settings
//! they depend on, owned in one place and handed to the shell explicitly.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use merit_core::{
  record::{NewRecord, PointRecord, PointType, StudentKey},
  reset::{backup_then_wipe, ResetOutcome},
  session::{self, SessionGate},
  store::RecordStore,
  view::{self, SearchTerm, View, ViewMode},
  ValidationError,
};
use merit_store_sqlite::SqliteStore;
use thiserror::Error;

use crate::config::{Settings, SettingsError};

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ContextError {
  #[error("{0}")]
  Validation(#[from] ValidationError),

  #[error(transparent)]
  Settings(#[from] SettingsError),

  #[error("storage error: {0}")]
  Store(#[from] merit_store_sqlite::Error),

  #[error("the password is set by MERIT_PASSWORD; unset it to change the password here")]
  PasswordLocked,
}

impl ContextError {
  /// Bad input rather than a failed write.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::Validation(_) | Self::Store(merit_store_sqlite::Error::Validation(_))
    )
  }
}

// ─── Paths ────────────────────────────────────────────────────────────────────

/// Where everything lives on disk.
#[derive(Debug, Clone)]
pub struct Paths {
  pub database: PathBuf,
  pub settings: PathBuf,
  pub backups:  PathBuf,
  pub log:      PathBuf,
}

impl Paths {
  /// The default layout inside one data directory.
  pub fn in_dir(dir: &Path) -> Self {
    Self {
      database: dir.join("data.db"),
      settings: dir.join("config.toml"),
      backups:  dir.join("backups"),
      log:      dir.join("merit.log"),
    }
  }
}

// ─── Context ──────────────────────────────────────────────────────────────────

pub struct AppContext {
  store:    SqliteStore,
  gate:     SessionGate,
  settings: Settings,
  paths:    Paths,
}

impl AppContext {
  /// Load settings and open the store named by `paths`.
  pub async fn open(paths: Paths) -> anyhow::Result<Self> {
    let settings = Settings::load(&paths.settings);
    let store = SqliteStore::open(&paths.database)
      .await
      .with_context(|| format!("failed to open store at {}", paths.database.display()))?;
    Ok(Self::new(store, settings, paths))
  }

  pub fn new(store: SqliteStore, settings: Settings, paths: Paths) -> Self {
    let gate = SessionGate::new(settings.password.clone());
    Self { store, gate, settings, paths }
  }

  pub fn paths(&self) -> &Paths { &self.paths }

  // ── Session ───────────────────────────────────────────────────────────────

  pub fn is_logged_in(&self) -> bool { self.gate.is_logged_in() }

  pub fn login(&mut self, candidate: &str) -> bool {
    let ok = self.gate.attempt(candidate);
    if ok {
      tracing::info!("login accepted");
    } else {
      tracing::warn!("login rejected");
    }
    ok
  }

  pub fn logout(&mut self) {
    self.gate.logout();
    tracing::info!("logged out");
  }

  /// Validate, persist, then apply. If the settings file cannot be written
  /// the old password stays in effect.
  pub fn change_secret(&mut self, new_secret: &str) -> Result<(), ContextError> {
    if self.settings.password_locked {
      return Err(ContextError::PasswordLocked);
    }
    session::validate_secret(new_secret)?;

    let mut updated = self.settings.clone();
    updated.password = new_secret.to_owned();
    updated.save(&self.paths.settings)?;

    self.gate.change_secret(new_secret)?;
    self.settings = updated;
    tracing::info!("password changed");
    Ok(())
  }

  // ── Records ───────────────────────────────────────────────────────────────

  /// Build a record from raw form input and store it.
  pub async fn add_record(
    &self,
    student_id: &str,
    name: &str,
    points: &str,
    reason: &str,
    point_type: PointType,
  ) -> Result<PointRecord, ContextError> {
    let record = NewRecord::from_form(student_id, name, points, reason, point_type)?;
    Ok(self.store.insert(record).await?)
  }

  pub async fn view(&self, mode: ViewMode, search: &str) -> Result<View, ContextError> {
    Ok(view::load_view(&self.store, mode, &SearchTerm::new(search)).await?)
  }

  pub async fn drill_down(&self, key: &StudentKey) -> Result<Vec<PointRecord>, ContextError> {
    Ok(view::drill_down(&self.store, key).await?)
  }

  /// Back up into the configured directory, then delete every record.
  pub async fn reset(&self) -> Result<ResetOutcome, ContextError> {
    Ok(backup_then_wipe(&self.store, &self.paths.backups).await?)
  }

  /// Release the store connection.
  pub async fn close(self) -> anyhow::Result<()> {
    self.store.close().await.context("closing record store")
  }
}
