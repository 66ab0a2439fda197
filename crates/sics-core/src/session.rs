//! Authenticated session, its lifecycle, and where it is persisted.
//!
//! ```text
//!   anonymous ──restore──▶ loading ──active user──▶ authenticated
//!       ▲                     │                          │
//!       └──failure/inactive───┘                          │
//!       └──────────────────────logout────────────────────┘
//! ```
//!
//! The session is always passed explicitly; there is no global state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  Error, Result,
  fields::Fields,
  permission::{Action, PermissionMatrix, has_permission},
  records::Person,
};

/// Storage key for the serialized [`Session`].
pub const SESSION_KEY: &str = "sics.session";
/// Storage key for the bearer token issued at login.
pub const TOKEN_KEY: &str = "sics.token";

// ─── Session record ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
  pub id:          String,
  #[serde(rename = "nombre")]
  pub name:        String,
  #[serde(rename = "permisos")]
  pub permissions: PermissionMatrix,
}

impl Role {
  fn from_fields(f: &Fields<'_>) -> Self {
    let role = f.nested(&["rol", "role"]);
    Self {
      id:          role.string(&["id"]),
      name:        f.string(&["rol.nombre", "rol.name", "rol", "role"]),
      permissions: PermissionMatrix::from_raw(
        f.nested(&["rol.permisos", "role.permissions", "permisos", "permissions"])
          .raw(),
      ),
    }
  }
}

/// The signed-in user as restored from storage or returned by login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
  pub user_id:  String,
  pub username: String,
  #[serde(rename = "activo")]
  pub active:   bool,
  #[serde(rename = "rol")]
  pub role:     Role,
  #[serde(rename = "persona")]
  pub person:   Person,
}

impl Session {
  /// Parse a login response of the form `{ findUser: { ... }, token? }`.
  pub fn from_login(raw: &Value) -> Result<Self> {
    let user = Fields::new(raw).nested(&["findUser", "user", "usuario"]);
    if user.raw().is_null() {
      return Err(Error::MissingUser);
    }
    Ok(Self {
      user_id:  user.string(&["id", "id_usuario"]),
      username: user.string(&["username", "nombre_usuario", "usuario"]),
      active:   user.flag(&["activo", "active"]),
      role:     Role::from_fields(&user),
      person:   Person::read(&user, &["persona.id", "persona_id"]),
    })
  }

  /// Display name: the person's full name, else the username.
  pub fn display_name(&self) -> String {
    let name = self.person.full_name();
    if name.is_empty() { self.username.clone() } else { name }
  }
}

/// Bearer token from a login response, if one was issued.
pub fn token_from_login(raw: &Value) -> Option<String> {
  let token = Fields::new(raw).string(&["token", "access_token", "findUser.token"]);
  (!token.is_empty()).then_some(token)
}

// ─── State machine ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
  #[default]
  Anonymous,
  Loading,
  Authenticated(Session),
}

impl SessionState {
  /// The active session, if any. `Loading` and inactive sessions yield `None`.
  pub fn session(&self) -> Option<&Session> {
    match self {
      Self::Authenticated(s) if s.active => Some(s),
      _ => None,
    }
  }

  pub fn is_loading(&self) -> bool { matches!(self, Self::Loading) }

  pub fn label(&self) -> &'static str {
    match self {
      Self::Anonymous => "anonymous",
      Self::Loading => "loading",
      Self::Authenticated(_) => "authenticated",
    }
  }
}

/// Return `view` only if the current session may perform `action` on
/// `module`. While a session is still loading nothing is rendered.
pub fn can_render<V>(state: &SessionState, module: &str, action: Action, view: V) -> Option<V> {
  has_permission(state.session(), module, action).then_some(view)
}

// ─── Storage ─────────────────────────────────────────────────────────────────

/// Synchronous key-value persistence for the session blob and token.
pub trait KeyValueStore {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get(&self, key: &str) -> Result<Option<Value>, Self::Error>;
  fn set(&mut self, key: &str, value: Value) -> Result<(), Self::Error>;
  fn remove(&mut self, key: &str) -> Result<(), Self::Error>;
}

/// Process-local store, used in tests and for throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  entries: HashMap<String, Value>,
}

impl KeyValueStore for MemoryStore {
  type Error = std::convert::Infallible;

  fn get(&self, key: &str) -> Result<Option<Value>, Self::Error> {
    Ok(self.entries.get(key).cloned())
  }

  fn set(&mut self, key: &str, value: Value) -> Result<(), Self::Error> {
    self.entries.insert(key.to_string(), value);
    Ok(())
  }

  fn remove(&mut self, key: &str) -> Result<(), Self::Error> {
    self.entries.remove(key);
    Ok(())
  }
}

fn storage_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
  Error::Storage(Box::new(e))
}

// ─── Manager ─────────────────────────────────────────────────────────────────

/// Owns the session state and keeps it in step with storage.
#[derive(Debug)]
pub struct SessionManager<K: KeyValueStore> {
  storage: K,
  state:   SessionState,
}

impl<K: KeyValueStore> SessionManager<K> {
  pub fn new(storage: K) -> Self {
    Self { storage, state: SessionState::Anonymous }
  }

  pub fn state(&self) -> &SessionState { &self.state }

  pub fn session(&self) -> Option<&Session> { self.state.session() }

  pub fn storage(&self) -> &K { &self.storage }

  /// The persisted bearer token, if any.
  pub fn token(&self) -> Option<String> {
    self
      .storage
      .get(TOKEN_KEY)
      .ok()
      .flatten()
      .and_then(|v| v.as_str().map(str::to_string))
  }

  /// Enter `loading` ahead of an attempt to restore.
  pub fn begin_restore(&mut self) { self.state = SessionState::Loading; }

  /// Finish a restore started with [`SessionManager::begin_restore`].
  ///
  /// A stored active session authenticates. Anything else, including an
  /// unreadable blob or an inactive user, leaves the manager anonymous and
  /// clears what was stored.
  pub fn complete_restore(&mut self) -> &SessionState {
    let restored = self
      .storage
      .get(SESSION_KEY)
      .ok()
      .flatten()
      .and_then(|blob| serde_json::from_value::<Session>(blob).ok())
      .filter(|s| s.active);

    match restored {
      Some(session) => self.state = SessionState::Authenticated(session),
      None => self.reset(),
    }
    &self.state
  }

  /// Fall back to anonymous and drop whatever was stored, best effort.
  fn reset(&mut self) {
    self.state = SessionState::Anonymous;
    self.storage.remove(SESSION_KEY).ok();
    self.storage.remove(TOKEN_KEY).ok();
  }

  /// Restore the session persisted by a previous login.
  pub fn restore(&mut self) -> &SessionState {
    self.begin_restore();
    self.complete_restore()
  }

  /// Apply a login response. Only an active user is persisted and
  /// authenticated. Any failure leaves the manager anonymous with nothing
  /// stored, even if a previous session was signed in.
  pub fn login(&mut self, response: &Value) -> Result<&Session> {
    self.state = SessionState::Loading;

    let session = match Session::from_login(response) {
      Ok(s) if s.active => s,
      Ok(_) => {
        self.reset();
        return Err(Error::InactiveUser);
      }
      Err(e) => {
        self.reset();
        return Err(e);
      }
    };

    if let Err(e) = self.persist(&session, token_from_login(response)) {
      self.reset();
      return Err(e);
    }

    self.state = SessionState::Authenticated(session);
    self.state.session().ok_or(Error::InactiveUser)
  }

  fn persist(&mut self, session: &Session, token: Option<String>) -> Result<()> {
    self
      .storage
      .set(SESSION_KEY, serde_json::to_value(session)?)
      .map_err(storage_err)?;
    let stored = match token {
      Some(t) => self.storage.set(TOKEN_KEY, Value::String(t)),
      None => self.storage.remove(TOKEN_KEY),
    };
    stored.map_err(storage_err)
  }

  /// Forget the session, in memory and in storage.
  pub fn logout(&mut self) -> Result<()> {
    self.state = SessionState::Anonymous;
    self.storage.remove(SESSION_KEY).map_err(storage_err)?;
    self.storage.remove(TOKEN_KEY).map_err(storage_err)
  }

  /// Drop a session the backend no longer accepts.
  pub fn invalidate(&mut self) -> Result<()> { self.logout() }
}
