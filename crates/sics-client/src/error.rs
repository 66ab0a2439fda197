//! Error type for `sics-client`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("could not reach the server: {0}")]
  Transport(#[from] reqwest::Error),

  /// The backend answered with a non-2xx status.
  #[error("request failed with status {status}: {message}")]
  Status { status: u16, message: String },

  #[error("core error: {0}")]
  Core(#[from] sics_core::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

impl Error {
  /// The backend rejected our credentials or token.
  pub fn is_unauthorized(&self) -> bool {
    matches!(self, Self::Status { status: 401, .. })
  }

  /// Text fit to show the user.
  pub fn user_message(&self) -> String {
    match self {
      Self::Transport(_) => "Could not reach the server. Try again later.".to_string(),
      Self::Status { message, .. } => message.clone(),
      other => other.to_string(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
