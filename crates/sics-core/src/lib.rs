//! Core types for the SICS health-records client.
//!
//! Turns loosely shaped backend payloads into canonical records, evaluates a
//! role's permission matrix, and tracks the session lifecycle. This crate is
//! deliberately free of HTTP and filesystem dependencies; persistence is
//! reached only through the [`session::KeyValueStore`] trait.

pub mod envelope;
pub mod error;
pub mod fields;
pub mod permission;
pub mod records;
pub mod session;

pub use envelope::{Envelope, EntityKind, Record, normalize_collection, normalize_one};
pub use error::{Error, Result};
pub use permission::{Action, PermissionMatrix, has_permission};
pub use session::{Session, SessionManager, SessionState, can_render};
