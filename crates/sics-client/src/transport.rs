//! The generic request helper.
//!
//! Every HTTP outcome resolves to an [`ApiResponse`]; only a failure to talk
//! to the server at all is an `Err`. Cookies are kept and sent on every call,
//! and the bearer token is attached when one is set.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, multipart::Form};
use serde_json::{Value, json};
use sics_core::fields::Fields;

use crate::{ClientConfig, Error, Result};

// ─── Response ────────────────────────────────────────────────────────────────

/// Status code plus parsed body, whatever the status.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
  pub status: u16,
  /// Parsed JSON body. A non-JSON body becomes `{"message": <text>}` and an
  /// empty body becomes `{}`.
  pub body:   Value,
}

impl ApiResponse {
  pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }

  /// The backend's own error or status message, if it sent one.
  pub fn message(&self) -> Option<String> {
    let message = Fields::new(&self.body).string(&["message", "error", "msg"]);
    (!message.is_empty()).then_some(message)
  }

  /// The body of a 2xx response, or [`Error::Status`] carrying the backend's
  /// message (or a generic one).
  pub fn into_result(self) -> Result<Value> {
    if self.is_success() {
      return Ok(self.body);
    }
    let message = self
      .message()
      .unwrap_or_else(|| format!("the server answered {}", self.status));
    Err(Error::Status { status: self.status, message })
  }
}

// ─── Transport ───────────────────────────────────────────────────────────────

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based and shares
/// its cookie jar between clones.
#[derive(Clone)]
pub struct Transport {
  client:   Client,
  base_url: String,
  token:    Option<String>,
}

impl Transport {
  pub fn new(config: &ClientConfig) -> Result<Self> {
    let client = Client::builder()
      .cookie_store(true)
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self {
      client,
      base_url: config.base_url.trim_end_matches('/').to_string(),
      token: None,
    })
  }

  pub fn with_token(mut self, token: Option<String>) -> Self {
    self.token = token;
    self
  }

  pub fn set_token(&mut self, token: Option<String>) { self.token = token; }

  pub fn base_url(&self) -> &str { &self.base_url }

  fn url(&self, path: &str) -> String {
    if path.starts_with('/') {
      format!("{}{}", self.base_url, path)
    } else {
      format!("{}/{}", self.base_url, path)
    }
  }

  fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
    match &self.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  /// Send a JSON request. `body` is serialised when present.
  pub async fn request(
    &self,
    path: &str,
    method: Method,
    body: Option<&Value>,
  ) -> Result<ApiResponse> {
    let url = self.url(path);
    tracing::debug!(%method, %url, "request");

    let mut req = self.authorize(self.client.request(method.clone(), url.as_str()));
    if let Some(body) = body {
      req = req.json(body);
    }
    let resp = req.send().await.inspect_err(|e| {
      tracing::warn!(%method, %url, error = %e, "request failed");
    })?;
    read_response(resp).await
  }

  /// Send a multipart form, e.g. a scanned certificate.
  pub async fn upload_request(
    &self,
    path: &str,
    form: Form,
    method: Method,
  ) -> Result<ApiResponse> {
    let url = self.url(path);
    tracing::debug!(%method, %url, "upload");

    let resp = self
      .authorize(self.client.request(method.clone(), url.as_str()))
      .multipart(form)
      .send()
      .await
      .inspect_err(|e| {
        tracing::warn!(%method, %url, error = %e, "upload failed");
      })?;
    read_response(resp).await
  }
}

async fn read_response(resp: Response) -> Result<ApiResponse> {
  let status = resp.status().as_u16();
  let text = resp.text().await?;
  let body = if text.trim().is_empty() {
    json!({})
  } else {
    serde_json::from_str(&text).unwrap_or_else(|_| json!({ "message": text }))
  };

  if !(200..300).contains(&status) {
    tracing::warn!(status, "server returned an error status");
  }
  Ok(ApiResponse { status, body })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn response(status: u16, body: Value) -> ApiResponse { ApiResponse { status, body } }

  #[test]
  fn success_yields_body() {
    let body = json!({ "data": [] });
    assert_eq!(response(201, body.clone()).into_result().unwrap(), body);
  }

  #[test]
  fn error_prefers_backend_message() {
    let err = response(409, json!({ "error": "CURP duplicada" }))
      .into_result()
      .unwrap_err();
    assert!(matches!(err, Error::Status { status: 409, ref message } if message == "CURP duplicada"));
  }

  #[test]
  fn error_without_message_gets_generic_text() {
    let err = response(502, json!({})).into_result().unwrap_err();
    assert_eq!(err.user_message(), "the server answered 502");
  }

  #[test]
  fn urls_join_with_a_single_slash() {
    let config = ClientConfig {
      base_url: "http://example.test/api/".into(),
      ..ClientConfig::default()
    };
    let transport = Transport::new(&config).unwrap();
    assert_eq!(transport.url("/afiliados"), "http://example.test/api/afiliados");
    assert_eq!(transport.url("afiliados"), "http://example.test/api/afiliados");
  }
}
