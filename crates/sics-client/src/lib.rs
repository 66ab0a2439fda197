//! HTTP client layer for the SICS backend.
//!
//! [`transport::Transport`] is the single generic request helper every screen
//! goes through. [`api::ApiClient`] builds the per-collection calls on top of
//! it and hands payloads to the normalizer in [`sics_core`].
//! [`page::ListPage`] holds what a list screen shows.

pub mod api;
pub mod error;
pub mod page;
pub mod storage;
pub mod transport;

pub use api::{ApiClient, Upload};
pub use error::{Error, Result};
pub use page::{ListPage, Notice};
pub use storage::FileStore;
pub use transport::{ApiResponse, Transport};

use std::path::PathBuf;

use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Client configuration, deserialised from `sics.toml` and `SICS_*` variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClientConfig {
  pub base_url:     String,
  /// JSON file backing the persisted session and token.
  pub storage_path: PathBuf,
  pub page_size:    usize,
  pub timeout_secs: u64,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      base_url:     "http://localhost:3000/api".to_string(),
      storage_path: PathBuf::from("~/.local/share/sics/session.json"),
      page_size:    page::DEFAULT_PAGE_SIZE,
      timeout_secs: 30,
    }
  }
}
