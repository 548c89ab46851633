//! The login gate.
//!
//! One shared secret, compared and stored in plain text. This is a local,
//! single-user tool: the gate keeps casual hands off the data and is not a
//! security boundary. There is no lockout and no hashing.

use crate::{Result, ValidationError};

/// Secret used when no settings file provides one.
pub const DEFAULT_SECRET: &str = "admin123";

/// Shortest secret [`SessionGate::change_secret`] accepts, in characters.
pub const MIN_SECRET_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
  #[default]
  LoggedOut,
  LoggedIn,
}

/// Check a candidate secret without changing anything.
pub fn validate_secret(secret: &str) -> Result<()> {
  if secret.chars().count() < MIN_SECRET_LEN {
    return Err(ValidationError::SecretTooShort { min: MIN_SECRET_LEN });
  }
  Ok(())
}

#[derive(Debug, Clone)]
pub struct SessionGate {
  secret: String,
  state:  SessionState,
}

impl Default for SessionGate {
  fn default() -> Self { Self::new(DEFAULT_SECRET) }
}

impl SessionGate {
  /// A logged-out gate guarding `secret`.
  pub fn new(secret: impl Into<String>) -> Self {
    Self { secret: secret.into(), state: SessionState::LoggedOut }
  }

  pub fn state(&self) -> SessionState { self.state }

  pub fn is_logged_in(&self) -> bool { self.state == SessionState::LoggedIn }

  /// Exact comparison against the current secret. Returns whether the gate
  /// opened; a mismatch leaves the state untouched.
  pub fn attempt(&mut self, candidate: &str) -> bool {
    if candidate == self.secret {
      self.state = SessionState::LoggedIn;
      true
    } else {
      false
    }
  }

  /// Replace the secret. Allowed in either state.
  pub fn change_secret(&mut self, new_secret: &str) -> Result<()> {
    validate_secret(new_secret)?;
    self.secret = new_secret.to_owned();
    Ok(())
  }

  pub fn logout(&mut self) { self.state = SessionState::LoggedOut; }
}
