//! Validation errors for `merit-core`.
//!
//! Everything in this crate that can fail does so because user input broke
//! an invariant. Persistence failures belong to the store backends.

use thiserror::Error;

use crate::record::PointType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("{0} must not be empty")]
  EmptyField(&'static str),

  #[error("points must be a whole number, got {0:?}")]
  InvalidPoints(String),

  #[error("points must be greater than zero, got {0}")]
  NonPositivePoints(i64),

  #[error("{point_type} record cannot carry {points} points")]
  SignMismatch { points: i64, point_type: PointType },

  #[error("password must be at least {min} characters")]
  SecretTooShort { min: usize },

  #[error("unknown point type: {0:?}")]
  UnknownPointType(String),
}

pub type Result<T, E = ValidationError> = std::result::Result<T, E>;
