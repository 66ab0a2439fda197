//! Collection envelopes and the response normalizer.
//!
//! The backend wraps lists in whatever shape the endpoint's author preferred.
//! [`Envelope::classify`] recognises a closed set of shapes in a fixed
//! priority order:
//!
//! 1. a bare array;
//! 2. an object holding an array under one of the entity's envelope keys;
//! 3. an object whose keys are all ASCII-digit indices;
//! 4. a single record, recognised by a diagnostic field;
//! 5. anything else, which is empty.
//!
//! [`normalize_collection`] then maps every object in the envelope through the
//! entity's [`Record`] mapper. It never fails.

use std::{cmp::Ordering, fmt, str::FromStr};

use serde_json::Value;

use crate::{Error, fields::Fields};

// ─── Entity kinds ────────────────────────────────────────────────────────────

/// The backend collections this client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
  Person,
  Affiliate,
  Doctor,
  Workplace,
  Laboratory,
  ClinicalExam,
  MedicalNote,
  Certificate,
  User,
}

impl EntityKind {
  pub const ALL: [EntityKind; 9] = [
    Self::Person,
    Self::Affiliate,
    Self::Doctor,
    Self::Workplace,
    Self::Laboratory,
    Self::ClinicalExam,
    Self::MedicalNote,
    Self::Certificate,
    Self::User,
  ];

  /// Module name used in the permission matrix. Doubles as the collection's
  /// path segment on the backend.
  pub fn module(self) -> &'static str {
    match self {
      Self::Person => "personas",
      Self::Affiliate => "afiliados",
      Self::Doctor => "medicos",
      Self::Workplace => "lugares_trabajo",
      Self::Laboratory => "laboratorios",
      Self::ClinicalExam => "examenes",
      Self::MedicalNote => "notas_medicas",
      Self::Certificate => "certificados",
      Self::User => "usuarios",
    }
  }

  /// Collection path relative to the API base URL.
  pub fn path(self) -> String { format!("/{}", self.module()) }

  /// Object keys that may hold this entity's list, in priority order.
  pub fn envelope_keys(self) -> &'static [&'static str] {
    match self {
      Self::Person => &["data", "personas", "people"],
      Self::Affiliate => &["data", "afiliados", "affiliates"],
      Self::Doctor => &["data", "medicos", "doctors"],
      Self::Workplace => &["data", "lugares_trabajo", "lugares", "lugaresTrabajo", "workplaces"],
      Self::Laboratory => &["data", "laboratorios", "laboratories"],
      Self::ClinicalExam => &["data", "examenes", "exams"],
      Self::MedicalNote => &["data", "notas_medicas", "notas", "notasMedicas", "notes"],
      Self::Certificate => &["data", "certificados", "certificates", "gallery"],
      Self::User => &["data", "usuarios", "users"],
    }
  }

  /// Fields whose presence marks an object as one record of this kind rather
  /// than a wrapper around several.
  pub fn diagnostic_fields(self) -> &'static [&'static str] {
    match self {
      Self::Person => &["persona", "curp"],
      Self::Affiliate => &["persona", "numero_afiliacion", "curp"],
      Self::Doctor => &["persona", "cedula_profesional", "cedula"],
      Self::Workplace => &["razon_social", "giro", "nombre"],
      Self::Laboratory => &["responsable", "nombre"],
      Self::ClinicalExam => &["tipo_examen", "resultado", "laboratorio_id"],
      Self::MedicalNote => &["diagnostico", "motivo", "medico_id"],
      Self::Certificate => &["folio", "fecha_vencimiento"],
      Self::User => &["persona", "username", "nombre_usuario", "rol"],
    }
  }
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.module())
  }
}

impl FromStr for EntityKind {
  type Err = Error;

  /// Accepts the module name in any casing (`afiliados`, `notasMedicas`).
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = crate::fields::fold_key(s);
    Self::ALL
      .into_iter()
      .find(|kind| crate::fields::fold_key(kind.module()) == wanted)
      .ok_or_else(|| Error::UnknownEntity(s.to_string()))
  }
}

// ─── Record mapping ──────────────────────────────────────────────────────────

/// A canonical record that can be built from any raw backend object.
///
/// Implementations must be total: every field gets a typed default when the
/// payload lacks it.
pub trait Record: Sized {
  const KIND: EntityKind;

  /// Build the canonical record, probing alternative source paths.
  fn from_fields(fields: &Fields<'_>) -> Self;

  /// Backend identifier, as a string.
  fn id(&self) -> &str;

  /// Text searched by client-side filtering.
  fn haystack(&self) -> Vec<&str>;

  fn from_raw(raw: &Value) -> Self { Self::from_fields(&Fields::new(raw)) }
}

// ─── Envelope ────────────────────────────────────────────────────────────────

/// The recognised wrapping of a list payload.
#[derive(Debug, PartialEq)]
pub enum Envelope<'a> {
  /// `[ ... ]`
  Bare(&'a [Value]),
  /// `{ "laboratories": [ ... ] }`
  Keyed { key: &'a str, items: &'a [Value] },
  /// `{ "0": ..., "1": ... }` with values already in numeric key order and
  /// falsy values removed.
  Indexed(Vec<&'a Value>),
  /// A single record object.
  Single(&'a Value),
  Empty,
}

impl<'a> Envelope<'a> {
  /// Classify `raw` as a collection of `kind`. First matching shape wins.
  pub fn classify(raw: &'a Value, kind: EntityKind) -> Self {
    let Value::Object(map) = raw else {
      return match raw {
        Value::Array(items) => Self::Bare(items),
        _ => Self::Empty,
      };
    };

    let keyed = kind.envelope_keys().iter().find_map(|key| {
      map
        .get(*key)
        .and_then(Value::as_array)
        .map(|items| (*key, items.as_slice()))
    });
    if let Some((key, items)) = keyed {
      return Self::Keyed { key, items };
    }

    if !map.is_empty() && map.keys().all(|k| is_index(k)) {
      let mut entries: Vec<(&str, &Value)> =
        map.iter().map(|(k, v)| (k.as_str(), v)).collect();
      entries.sort_by(|(a, _), (b, _)| cmp_index(a, b));
      return Self::Indexed(
        entries
          .into_iter()
          .map(|(_, v)| v)
          .filter(|v| !is_falsy(v))
          .collect(),
      );
    }

    if Fields::new(raw).has_any(kind.diagnostic_fields()) {
      return Self::Single(raw);
    }

    Self::Empty
  }

  /// The raw items in backend order.
  pub fn items(&self) -> Vec<&'a Value> {
    match self {
      Self::Bare(items) | Self::Keyed { items, .. } => (*items).iter().collect(),
      Self::Indexed(items) => items.clone(),
      Self::Single(item) => vec![*item],
      Self::Empty => Vec::new(),
    }
  }
}

fn is_index(key: &str) -> bool {
  !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Numeric comparison of digit strings of any length.
fn cmp_index(a: &str, b: &str) -> Ordering {
  let a_digits = a.trim_start_matches('0');
  let b_digits = b.trim_start_matches('0');
  a_digits
    .len()
    .cmp(&b_digits.len())
    .then_with(|| a_digits.cmp(b_digits))
    .then_with(|| a.cmp(b))
}

fn is_falsy(value: &Value) -> bool {
  match value {
    Value::Null => true,
    Value::Bool(b) => !b,
    Value::Number(n) => n.as_f64().is_none_or(|f| f == 0.0),
    Value::String(s) => s.is_empty(),
    Value::Array(_) | Value::Object(_) => false,
  }
}

// ─── Normalizer ──────────────────────────────────────────────────────────────

/// Reduce any recognised envelope to an ordered list of canonical records.
///
/// Items that are not objects are skipped; unrecognised payloads yield an
/// empty list.
pub fn normalize_collection<R: Record>(raw: &Value) -> Vec<R> {
  Envelope::classify(raw, R::KIND)
    .items()
    .into_iter()
    .filter(|item| item.is_object())
    .map(R::from_raw)
    .collect()
}

/// Normalize a detail payload to its first record, if any.
pub fn normalize_one<R: Record>(raw: &Value) -> Option<R> {
  normalize_collection(raw).into_iter().next()
}
