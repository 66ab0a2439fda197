//! Lenient field access over raw JSON records.
//!
//! The backend spells the same field several ways (`apellidoPaterno`,
//! `apellido_paterno`, `ApellidoPaterno`) and sometimes nests person data
//! under a `persona` object. [`Fields`] probes a list of dotted paths in
//! priority order and coerces the first usable value into the requested type.
//! Nothing here fails: an unusable value simply moves the probe on to the next
//! path, and an exhausted probe yields the type's default.

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

static NULL: Value = Value::Null;

/// Read-only view over one raw record.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
  raw: &'a Value,
}

impl<'a> Fields<'a> {
  pub fn new(raw: &'a Value) -> Self { Self { raw } }

  /// A view with no fields; every probe returns its default.
  pub fn empty() -> Fields<'static> { Fields { raw: &NULL } }

  pub fn raw(&self) -> &'a Value { self.raw }

  /// Resolve a dotted path such as `persona.curp`. `null` counts as absent.
  ///
  /// Each segment is matched exactly first, then ignoring ASCII case,
  /// underscores, and hyphens.
  pub fn lookup(&self, path: &str) -> Option<&'a Value> {
    path
      .split('.')
      .try_fold(self.raw, |value, segment| get_key(value.as_object()?, segment))
  }

  /// `true` if any of `paths` resolves to a non-null value.
  pub fn has_any<S: AsRef<str>>(&self, paths: &[S]) -> bool {
    paths.iter().any(|p| self.lookup(p.as_ref()).is_some())
  }

  /// First path that holds a string or number, as a string; otherwise `""`.
  pub fn string<S: AsRef<str>>(&self, paths: &[S]) -> String {
    paths
      .iter()
      .find_map(|p| self.lookup(p.as_ref()).and_then(coerce_string))
      .unwrap_or_default()
  }

  /// First path that holds something boolean-like; otherwise `false`.
  pub fn flag<S: AsRef<str>>(&self, paths: &[S]) -> bool {
    self.flag_or(paths, false)
  }

  /// Like [`Fields::flag`] with a caller-chosen fallback.
  pub fn flag_or<S: AsRef<str>>(&self, paths: &[S], default: bool) -> bool {
    paths
      .iter()
      .find_map(|p| self.lookup(p.as_ref()).and_then(coerce_flag))
      .unwrap_or(default)
  }

  /// First path that holds a parseable date; otherwise `None`.
  pub fn date<S: AsRef<str>>(&self, paths: &[S]) -> Option<NaiveDate> {
    paths
      .iter()
      .find_map(|p| self.lookup(p.as_ref()).and_then(coerce_date))
  }

  /// First path that holds an object, as a nested view. Missing sub-objects
  /// yield an empty view so callers can keep probing without branching.
  pub fn nested<S: AsRef<str>>(&self, paths: &[S]) -> Fields<'a> {
    paths
      .iter()
      .find_map(|p| self.lookup(p.as_ref()).filter(|v| v.is_object()))
      .map(Fields::new)
      .unwrap_or(Fields { raw: &NULL })
  }
}

// ─── Key matching ────────────────────────────────────────────────────────────

fn get_key<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
  if let Some(value) = map.get(key).filter(|v| !v.is_null()) {
    return Some(value);
  }
  let wanted = fold_key(key);
  map
    .iter()
    .find(|(k, v)| !v.is_null() && fold_key(k) == wanted)
    .map(|(_, v)| v)
}

/// `apellidoPaterno`, `apellido_paterno` and `Apellido-Paterno` all fold to
/// `apellidopaterno`.
pub(crate) fn fold_key(key: &str) -> String {
  key
    .chars()
    .filter(|c| *c != '_' && *c != '-')
    .map(|c| c.to_ascii_lowercase())
    .collect()
}

// ─── Coercion ────────────────────────────────────────────────────────────────

fn coerce_string(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

fn coerce_flag(value: &Value) -> Option<bool> {
  match value {
    Value::Bool(b) => Some(*b),
    Value::Number(n) => n.as_f64().map(|f| f != 0.0),
    Value::String(s) => match s.trim().to_lowercase().as_str() {
      "true" | "1" | "si" | "sí" | "yes" | "activo" | "active" => Some(true),
      "false" | "0" | "no" | "inactivo" | "inactive" => Some(false),
      _ => None,
    },
    _ => None,
  }
}

fn coerce_date(value: &Value) -> Option<NaiveDate> {
  match value {
    Value::String(s) => parse_date(s.trim()),
    Value::Number(n) => n
      .as_i64()
      .and_then(DateTime::from_timestamp_millis)
      .map(|dt| dt.date_naive()),
    _ => None,
  }
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps, anything whose first ten
/// characters are an ISO date, and `DD/MM/YYYY`.
fn parse_date(s: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
    .or_else(|| {
      s.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    })
    .or_else(|| NaiveDate::parse_from_str(s, "%d/%m/%Y").ok())
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn nested_path_wins_over_flat_field() {
    let raw = json!({ "persona": { "curp": "NESTED" }, "curp": "FLAT" });
    let f = Fields::new(&raw);
    assert_eq!(f.string(&["persona.curp", "curp"]), "NESTED");
    assert_eq!(f.string(&["curp"]), "FLAT");
  }

  #[test]
  fn casing_variants_are_reconciled() {
    let camel = json!({ "apellidoPaterno": "López" });
    let snake = json!({ "apellido_paterno": "López" });
    let pascal = json!({ "ApellidoPaterno": "López" });
    for raw in [&camel, &snake, &pascal] {
      assert_eq!(Fields::new(raw).string(&["apellido_paterno"]), "López");
    }
  }

  #[test]
  fn null_values_fall_through_to_the_next_path() {
    let raw = json!({ "persona": { "telefono": null }, "telefono": "555" });
    let f = Fields::new(&raw);
    assert_eq!(f.string(&["persona.telefono", "telefono"]), "555");
  }

  #[test]
  fn missing_values_take_typed_defaults() {
    let raw = json!({});
    let f = Fields::new(&raw);
    assert_eq!(f.string(&["nombre"]), "");
    assert!(!f.flag(&["activo"]));
    assert!(f.flag_or(&["activo"], true));
    assert_eq!(f.date(&["fecha"]), None);
  }

  #[test]
  fn numbers_coerce_to_strings() {
    let raw = json!({ "id": 42 });
    assert_eq!(Fields::new(&raw).string(&["id"]), "42");
  }

  #[test]
  fn objects_are_not_coerced_to_strings() {
    let raw = json!({ "rol": { "nombre": "Admin" } });
    let f = Fields::new(&raw);
    assert_eq!(f.string(&["rol", "rol.nombre"]), "Admin");
  }

  #[test]
  fn flags_accept_several_spellings() {
    for (value, expected) in [
      (json!(true), true),
      (json!(0), false),
      (json!(1), true),
      (json!("Activo"), true),
      (json!("no"), false),
    ] {
      let raw = json!({ "activo": value });
      assert_eq!(Fields::new(&raw).flag(&["activo"]), expected);
    }
  }

  #[test]
  fn unrecognised_flag_strings_fall_through() {
    let raw = json!({ "estatus": "pendiente", "activo": true });
    assert!(Fields::new(&raw).flag(&["estatus", "activo"]));
  }

  #[test]
  fn dates_in_several_formats() {
    let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
    for value in [
      json!("2024-03-15"),
      json!("2024-03-15T10:30:00.000Z"),
      json!("2024-03-15 10:30:00"),
      json!("15/03/2024"),
    ] {
      let raw = json!({ "fecha": value });
      assert_eq!(Fields::new(&raw).date(&["fecha"]), expected, "{raw}");
    }
  }

  #[test]
  fn garbage_dates_are_none() {
    let raw = json!({ "fecha": "mañana" });
    assert_eq!(Fields::new(&raw).date(&["fecha"]), None);
  }

  #[test]
  fn nested_view_over_missing_object_is_empty() {
    let raw = json!({ "persona": "not an object" });
    let persona = Fields::new(&raw).nested(&["persona"]);
    assert!(persona.raw().is_null());
    assert_eq!(persona.string(&["nombre"]), "");
  }
}
