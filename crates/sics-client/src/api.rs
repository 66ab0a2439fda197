//! Per-collection calls against the SICS REST API.
//!
//! | Call | Request |
//! |------|---------|
//! | [`ApiClient::login`] | `POST /auth/login` |
//! | [`ApiClient::logout`] | `POST /auth/logout` |
//! | [`ApiClient::fetch`] | `GET /<module>` |
//! | [`ApiClient::fetch_one`] | `GET /<module>/<id>` |
//! | [`ApiClient::create`] | `POST /<module>` |
//! | [`ApiClient::update`] | `PUT /<module>/<id>` |
//! | [`ApiClient::delete`] | `DELETE /<module>/<id>` |
//! | [`ApiClient::upload`] | `PUT /<module>/<id>/upload` (multipart) |

use reqwest::{
  Method,
  multipart::{Form, Part},
};
use serde_json::{Value, json};
use sics_core::{EntityKind, Record, normalize_collection, normalize_one};

use crate::{Result, transport::Transport};

/// A file to send with [`ApiClient::upload`].
#[derive(Debug, Clone)]
pub struct Upload {
  /// Multipart field name the backend expects, e.g. `archivo`.
  pub field:     String,
  pub file_name: String,
  pub mime:      Option<String>,
  pub bytes:     Vec<u8>,
}

/// Typed access to the backend. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
  transport: Transport,
}

impl ApiClient {
  pub fn new(transport: Transport) -> Self { Self { transport } }

  pub fn transport(&self) -> &Transport { &self.transport }

  pub fn set_token(&mut self, token: Option<String>) { self.transport.set_token(token); }

  // ── Auth ─────────────────────────────────────────────────────────────────

  /// `POST /auth/login` — returns the raw login payload for
  /// [`sics_core::SessionManager::login`].
  pub async fn login(&self, username: &str, password: &str) -> Result<Value> {
    let body = json!({ "username": username, "password": password });
    self
      .transport
      .request("/auth/login", Method::POST, Some(&body))
      .await?
      .into_result()
  }

  /// `POST /auth/logout` — lets the backend drop its cookie session.
  pub async fn logout(&self) -> Result<()> {
    self
      .transport
      .request("/auth/logout", Method::POST, None)
      .await?
      .into_result()
      .map(drop)
  }

  // ── Reads ────────────────────────────────────────────────────────────────

  /// `GET /<module>`, normalized into canonical records.
  pub async fn fetch<R: Record>(&self) -> Result<Vec<R>> {
    let body = self
      .transport
      .request(&R::KIND.path(), Method::GET, None)
      .await?
      .into_result()?;
    Ok(normalize_collection(&body))
  }

  /// `GET /<module>/<id>`. `None` when the payload holds no record.
  pub async fn fetch_one<R: Record>(&self, id: &str) -> Result<Option<R>> {
    let body = self
      .transport
      .request(&item_path(R::KIND, id), Method::GET, None)
      .await?
      .into_result()?;
    Ok(normalize_one(&body))
  }

  // ── Writes ───────────────────────────────────────────────────────────────

  /// `POST /<module>`
  pub async fn create(&self, kind: EntityKind, body: &Value) -> Result<Value> {
    self
      .transport
      .request(&kind.path(), Method::POST, Some(body))
      .await?
      .into_result()
  }

  /// `PUT /<module>/<id>`
  pub async fn update(&self, kind: EntityKind, id: &str, body: &Value) -> Result<Value> {
    self
      .transport
      .request(&item_path(kind, id), Method::PUT, Some(body))
      .await?
      .into_result()
  }

  /// `DELETE /<module>/<id>`
  pub async fn delete(&self, kind: EntityKind, id: &str) -> Result<Value> {
    self
      .transport
      .request(&item_path(kind, id), Method::DELETE, None)
      .await?
      .into_result()
  }

  /// `PUT /<module>/<id>/upload` with a single file part.
  pub async fn upload(&self, kind: EntityKind, id: &str, file: Upload) -> Result<Value> {
    let mut part = Part::bytes(file.bytes).file_name(file.file_name);
    if let Some(mime) = &file.mime {
      part = part.mime_str(mime)?;
    }
    let form = Form::new().part(file.field, part);
    self
      .transport
      .upload_request(&format!("{}/upload", item_path(kind, id)), form, Method::PUT)
      .await?
      .into_result()
  }
}

/// `/<module>/<id>` with the id encoded as a single path segment.
fn item_path(kind: EntityKind, id: &str) -> String {
  format!("{}/{}", kind.path(), urlencoding::encode(id))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn item_path_keeps_plain_ids() {
    assert_eq!(item_path(EntityKind::Affiliate, "42"), "/afiliados/42");
    assert_eq!(item_path(EntityKind::MedicalNote, "n-7_a.b~c"), "/notas_medicas/n-7_a.b~c");
  }

  #[test]
  fn item_path_encodes_reserved_characters() {
    assert_eq!(item_path(EntityKind::Certificate, "a/b"), "/certificados/a%2Fb");
    assert_eq!(item_path(EntityKind::Affiliate, "1?x=2#f"), "/afiliados/1%3Fx%3D2%23f");
    assert_eq!(item_path(EntityKind::Doctor, "../usuarios"), "/medicos/..%2Fusuarios");
  }
}
