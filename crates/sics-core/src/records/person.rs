//! Person data shared by affiliates, doctors, and users.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  envelope::{EntityKind, Record},
  fields::Fields,
};

/// Identity and contact fields of a natural person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:               String,
  pub curp:             String,
  pub nombre:           String,
  pub apellido_paterno: String,
  pub apellido_materno: String,
  pub telefono:         String,
  pub correo:           String,
  pub direccion:        String,
  pub genero:           String,
  pub fecha_nacimiento: Option<NaiveDate>,
}

impl Person {
  /// Read a person that may be nested under `persona` or flattened into the
  /// owning record. `id_paths` are probed for the person's own identifier, so
  /// owners can keep their top-level `id` out of it.
  pub fn read(fields: &Fields<'_>, id_paths: &[&str]) -> Self {
    Self {
      id:               fields.string(id_paths),
      curp:             fields.string(&paths(&["curp"])),
      nombre:           fields.string(&paths(&["nombre", "nombres", "name"])),
      apellido_paterno: fields.string(&paths(&["apellido_paterno", "primer_apellido"])),
      apellido_materno: fields.string(&paths(&["apellido_materno", "segundo_apellido"])),
      telefono:         fields.string(&paths(&["telefono", "celular", "phone"])),
      correo:           fields.string(&paths(&["correo", "email"])),
      direccion:        fields.string(&paths(&["direccion", "domicilio"])),
      genero:           fields.string(&paths(&["genero", "sexo"])),
      fecha_nacimiento: fields.date(&paths(&["fecha_nacimiento"])),
    }
  }

  /// Given name followed by both surnames, skipping empty parts.
  pub fn full_name(&self) -> String {
    [&self.nombre, &self.apellido_paterno, &self.apellido_materno]
      .into_iter()
      .map(|s| s.trim())
      .filter(|s| !s.is_empty())
      .collect::<Vec<_>>()
      .join(" ")
  }

  pub(crate) fn search_fields(&self) -> [&str; 5] {
    [
      &self.curp,
      &self.nombre,
      &self.apellido_paterno,
      &self.apellido_materno,
      &self.correo,
    ]
  }
}

/// Every name under the nested person objects first, then at top level.
fn paths(names: &[&str]) -> Vec<String> {
  ["persona.", "person.", ""]
    .iter()
    .flat_map(|prefix| names.iter().map(move |name| format!("{prefix}{name}")))
    .collect()
}

impl Record for Person {
  const KIND: EntityKind = EntityKind::Person;

  fn from_fields(fields: &Fields<'_>) -> Self {
    Self::read(fields, &["persona.id", "id"])
  }

  fn id(&self) -> &str { &self.id }

  fn haystack(&self) -> Vec<&str> { self.search_fields().into() }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn nested_and_flat_persons_map_identically() {
    let nested = json!({
      "id": 10,
      "persona": {
        "id": 3,
        "curp": "GOMA800101HDFRRN09",
        "nombre": "Ana",
        "apellidoPaterno": "Gómez",
        "apellidoMaterno": "Ruiz",
        "email": "ana@example.com",
        "fechaNacimiento": "1980-01-01"
      }
    });
    let flat = json!({
      "persona_id": 3,
      "curp": "GOMA800101HDFRRN09",
      "nombre": "Ana",
      "apellido_paterno": "Gómez",
      "apellido_materno": "Ruiz",
      "correo": "ana@example.com",
      "fecha_nacimiento": "1980-01-01T00:00:00Z"
    });

    let ids = ["persona.id", "persona_id"];
    let a = Person::read(&Fields::new(&nested), &ids);
    let b = Person::read(&Fields::new(&flat), &ids);
    assert_eq!(a, b);
    assert_eq!(a.id, "3");
    assert_eq!(a.full_name(), "Ana Gómez Ruiz");
    assert_eq!(a.fecha_nacimiento, NaiveDate::from_ymd_opt(1980, 1, 1));
  }

  #[test]
  fn missing_person_is_all_defaults() {
    let raw = json!({ "id": 1 });
    let person = Person::read(&Fields::new(&raw), &["persona.id"]);
    assert_eq!(person, Person::default());
    assert_eq!(person.full_name(), "");
  }

  #[test]
  fn full_name_skips_blank_parts() {
    let person = Person {
      nombre: "Luis".into(),
      apellido_materno: "Pérez".into(),
      ..Person::default()
    };
    assert_eq!(person.full_name(), "Luis Pérez");
  }
}
