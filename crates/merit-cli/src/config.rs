//! The settings file.
//!
//! A small TOML document next to the database. Today it holds only the login
//! password. Values are layered: compiled defaults, then the file, then
//! `MERIT_*` environment variables.

use std::path::Path;

use merit_core::session::DEFAULT_SECRET;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable that overrides the password in the file.
pub const PASSWORD_ENV: &str = "MERIT_PASSWORD";

#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("reading settings: {0}")]
  Load(#[from] config::ConfigError),

  #[error("encoding settings: {0}")]
  Encode(#[from] toml::ser::Error),

  #[error("writing settings: {0}")]
  Write(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
  /// Secret required by the login gate.
  #[serde(default = "default_password")]
  pub password:        String,
  /// Set when [`PASSWORD_ENV`] supplies the password. A value saved to the
  /// file would be overridden again on the next start.
  #[serde(skip)]
  pub password_locked: bool,
}

fn default_password() -> String { DEFAULT_SECRET.to_owned() }

impl Default for Settings {
  fn default() -> Self { Self { password: default_password(), password_locked: false } }
}

impl Settings {
  /// Load settings, falling back to defaults on any failure.
  ///
  /// A missing file is normal on first start. An unreadable or malformed one
  /// is logged before its contents are ignored.
  pub fn load(path: &Path) -> Self {
    let mut settings = match Self::try_load(path) {
      Ok(settings) => settings,
      Err(e) => {
        tracing::warn!(error = %e, path = %path.display(), "failed to load settings, using defaults");
        Self::default()
      }
    };
    settings.password_locked = std::env::var_os(PASSWORD_ENV).is_some();
    if settings.password_locked {
      tracing::info!(var = PASSWORD_ENV, "password supplied by environment");
    }
    settings
  }

  pub fn try_load(path: &Path) -> Result<Self, SettingsError> {
    let layered = config::Config::builder()
      .add_source(
        config::File::from(path.to_path_buf())
          .format(config::FileFormat::Toml)
          .required(false),
      )
      .add_source(config::Environment::with_prefix("MERIT"))
      .build()?;
    Ok(layered.try_deserialize()?)
  }

  /// Write the settings file, creating its directory if needed.
  pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(self)?)?;
    tracing::info!(path = %path.display(), "settings saved");
    Ok(())
  }
}
