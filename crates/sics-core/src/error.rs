//! Error types for `sics-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown action token: {0:?}")]
  UnknownAction(String),

  #[error("unknown entity kind: {0:?}")]
  UnknownEntity(String),

  #[error("login response did not contain a user")]
  MissingUser,

  #[error("user account is inactive")]
  InactiveUser,

  #[error("session storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
