//! Role permission matrix and the permission gate.
//!
//! Wire format, as found under a role's `permisos`:
//!
//! ```json
//! { "modulos": { "afiliados": ["create", "read"] }, "sistema": { ... } }
//! ```
//!
//! Everything is fail-closed: a missing module, an empty action list, an
//! unknown action token, or an inactive session all deny.

use std::{
  collections::{BTreeMap, BTreeSet},
  fmt,
  str::FromStr,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, fields::Fields, session::Session};

// ─── Action ──────────────────────────────────────────────────────────────────

/// A CRUD action a role may be granted on a module.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Action {
  Create,
  Read,
  Update,
  Delete,
}

impl Action {
  pub const ALL: [Action; 4] = [Self::Create, Self::Read, Self::Update, Self::Delete];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Create => "create",
      Self::Read => "read",
      Self::Update => "update",
      Self::Delete => "delete",
    }
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Action {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|a| a.as_str() == s)
      .ok_or_else(|| Error::UnknownAction(s.to_string()))
  }
}

// ─── Matrix ──────────────────────────────────────────────────────────────────

/// Module name → granted actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionMatrix {
  #[serde(rename = "modulos", default)]
  pub modules: BTreeMap<String, BTreeSet<Action>>,
  /// System-wide settings carried alongside the modules; opaque here.
  #[serde(rename = "sistema", default, skip_serializing_if = "Option::is_none")]
  pub system:  Option<Map<String, Value>>,
}

impl PermissionMatrix {
  /// Read a matrix from its wire form without failing. Non-array module
  /// entries grant nothing; unknown action tokens are dropped.
  pub fn from_raw(raw: &Value) -> Self {
    let fields = Fields::new(raw);
    let modules = fields
      .nested(&["modulos", "modules"])
      .raw()
      .as_object()
      .map(|modules| {
        modules
          .iter()
          .map(|(name, actions)| (name.clone(), parse_actions(actions)))
          .collect()
      })
      .unwrap_or_default();
    let system = fields
      .nested(&["sistema", "system"])
      .raw()
      .as_object()
      .cloned();
    Self { modules, system }
  }

  /// Builder used mostly by tests and fixtures.
  pub fn with(mut self, module: &str, actions: impl IntoIterator<Item = Action>) -> Self {
    self
      .modules
      .entry(module.to_string())
      .or_default()
      .extend(actions);
    self
  }

  /// `true` only if `module` is present and lists `action`.
  pub fn allows(&self, module: &str, action: Action) -> bool {
    self
      .modules
      .get(module)
      .is_some_and(|actions| actions.contains(&action))
  }

  /// Granted actions for `module`, in CRUD order.
  pub fn allowed(&self, module: &str) -> Vec<Action> {
    self
      .modules
      .get(module)
      .map(|actions| actions.iter().copied().collect())
      .unwrap_or_default()
  }
}

fn parse_actions(raw: &Value) -> BTreeSet<Action> {
  raw
    .as_array()
    .map(|tokens| {
      tokens
        .iter()
        .filter_map(Value::as_str)
        .filter_map(|t| t.parse().ok())
        .collect()
    })
    .unwrap_or_default()
}

// ─── Gate ────────────────────────────────────────────────────────────────────

/// Decide whether `session` may perform `action` on `module`.
///
/// Denies when the session is absent or inactive, when the module is not in
/// the role's matrix, or when the module's set lacks the action.
pub fn has_permission(session: Option<&Session>, module: &str, action: Action) -> bool {
  session.is_some_and(|s| s.active && s.role.permissions.allows(module, action))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn action_tokens_parse_and_display() {
    for action in Action::ALL {
      assert_eq!(action.to_string().parse::<Action>().unwrap(), action);
    }
    assert!(matches!("export".parse::<Action>(), Err(Error::UnknownAction(t)) if t == "export"));
    assert!("READ".parse::<Action>().is_err());
  }

  #[test]
  fn matrix_from_wire_format() {
    let raw = json!({
      "modulos": {
        "afiliados": ["create", "read", "export"],
        "medicos": [],
        "laboratorios": "read"
      },
      "sistema": { "mantenimiento": false }
    });
    let m = PermissionMatrix::from_raw(&raw);
    assert_eq!(m.allowed("afiliados"), vec![Action::Create, Action::Read]);
    assert!(m.allowed("medicos").is_empty());
    assert!(m.modules.contains_key("medicos"));
    assert!(!m.allows("laboratorios", Action::Read));
    assert_eq!(m.system.as_ref().map(Map::len), Some(1));
  }

  #[test]
  fn absent_module_grants_nothing() {
    let m = PermissionMatrix::default().with("afiliados", [Action::Read]);
    assert!(m.allows("afiliados", Action::Read));
    for action in Action::ALL {
      assert!(!m.allows("usuarios", action));
    }
  }

  #[test]
  fn malformed_matrix_is_empty() {
    for raw in [json!(null), json!([]), json!({ "modulos": 3 })] {
      assert_eq!(PermissionMatrix::from_raw(&raw), PermissionMatrix::default());
    }
  }

  #[test]
  fn matrix_serializes_to_wire_names() {
    let m = PermissionMatrix::default().with("afiliados", [Action::Delete, Action::Read]);
    assert_eq!(
      serde_json::to_value(&m).unwrap(),
      json!({ "modulos": { "afiliados": ["read", "delete"] } })
    );
  }
}
