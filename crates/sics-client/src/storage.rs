//! [`FileStore`] — a JSON file implementing [`KeyValueStore`].
//!
//! The whole file is one JSON object of key → value. It is read once on open
//! and rewritten on every mutation. It holds the bearer token, so on Unix it
//! is kept owner-only (`0o600`).

use std::{
  fs::{self, OpenOptions},
  io::{ErrorKind, Write as _},
  path::{Path, PathBuf},
};

use serde_json::{Map, Value};
use sics_core::session::KeyValueStore;

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct FileStore {
  path:    PathBuf,
  entries: Map<String, Value>,
}

impl FileStore {
  /// Open the store at `path`. A missing file is an empty store; an
  /// unreadable one is logged and treated as empty.
  pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
    let path = path.into();
    let entries = match fs::read_to_string(&path) {
      Ok(raw) => match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => map,
        _ => {
          tracing::warn!(path = %path.display(), "ignoring malformed session file");
          Map::new()
        }
      },
      Err(e) if e.kind() == ErrorKind::NotFound => Map::new(),
      Err(e) => return Err(e.into()),
    };
    Ok(Self { path, entries })
  }

  pub fn path(&self) -> &Path { &self.path }

  fn flush(&self) -> Result<()> {
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent)?;
    }
    let mut opts = OpenOptions::new();
    opts.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
      use std::os::unix::fs::OpenOptionsExt;
      opts.mode(0o600);
    }
    let mut file = opts.open(&self.path)?;
    // `mode` only applies on creation.
    #[cfg(unix)]
    restrict_permissions(&file)?;
    file.write_all(&serde_json::to_vec_pretty(&self.entries)?)?;
    Ok(())
  }
}

#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> Result<()> {
  use std::os::unix::fs::PermissionsExt;
  file.set_permissions(fs::Permissions::from_mode(0o600))?;
  Ok(())
}

impl KeyValueStore for FileStore {
  type Error = Error;

  fn get(&self, key: &str) -> Result<Option<Value>> {
    Ok(self.entries.get(key).cloned())
  }

  fn set(&mut self, key: &str, value: Value) -> Result<()> {
    self.entries.insert(key.to_string(), value);
    self.flush()
  }

  fn remove(&mut self, key: &str) -> Result<()> {
    if self.entries.remove(key).is_some() {
      self.flush()?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path().join("session.json")).unwrap();
    assert_eq!(store.get("sics.session").unwrap(), None);
  }

  #[test]
  fn values_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("session.json");

    let mut store = FileStore::open(&path).unwrap();
    store.set("sics.token", json!("abc")).unwrap();
    store.set("sics.session", json!({ "activo": true })).unwrap();
    store.remove("sics.token").unwrap();

    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(reopened.get("sics.token").unwrap(), None);
    assert_eq!(reopened.get("sics.session").unwrap(), Some(json!({ "activo": true })));
  }

  #[cfg(unix)]
  #[test]
  fn session_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let mut store = FileStore::open(&path).unwrap();
    store.set("sics.token", json!("secret-bearer")).unwrap();
    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600, "got {mode:o}");

    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
    store.set("sics.session", json!({ "activo": true })).unwrap();
    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600, "got {mode:o}");
  }

  #[test]
  fn malformed_file_is_treated_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    fs::write(&path, "not json").unwrap();

    let store = FileStore::open(&path).unwrap();
    assert_eq!(store.get("sics.session").unwrap(), None);
  }
}
