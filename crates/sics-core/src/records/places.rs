//! Establishments: workplaces where affiliates work and the laboratories that
//! run their exams.

use serde::{Deserialize, Serialize};

use crate::{
  envelope::{EntityKind, Record},
  fields::Fields,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workplace {
  pub id:        String,
  pub nombre:    String,
  pub direccion: String,
  pub telefono:  String,
  /// Line of business, e.g. restaurant or bar.
  pub giro:      String,
  pub activo:    bool,
}

impl Record for Workplace {
  const KIND: EntityKind = EntityKind::Workplace;

  fn from_fields(f: &Fields<'_>) -> Self {
    Self {
      id:        f.string(&["id", "id_lugar_trabajo", "lugar_trabajo_id"]),
      nombre:    f.string(&["nombre", "razon_social", "name"]),
      direccion: f.string(&["direccion", "domicilio"]),
      telefono:  f.string(&["telefono", "phone"]),
      giro:      f.string(&["giro", "giro.nombre", "actividad"]),
      activo:    f.flag(&["activo", "active"]),
    }
  }

  fn id(&self) -> &str { &self.id }

  fn haystack(&self) -> Vec<&str> {
    vec![self.nombre.as_str(), self.direccion.as_str(), self.giro.as_str()]
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Laboratory {
  pub id:          String,
  pub nombre:      String,
  pub direccion:   String,
  pub telefono:    String,
  pub responsable: String,
  pub activo:      bool,
}

impl Record for Laboratory {
  const KIND: EntityKind = EntityKind::Laboratory;

  fn from_fields(f: &Fields<'_>) -> Self {
    Self {
      id:          f.string(&["id", "id_laboratorio", "laboratorio_id"]),
      nombre:      f.string(&["nombre", "name", "razon_social"]),
      direccion:   f.string(&["direccion", "domicilio", "address"]),
      telefono:    f.string(&["telefono", "phone"]),
      responsable: f.string(&["responsable", "responsable.nombre", "encargado"]),
      activo:      f.flag(&["activo", "active"]),
    }
  }

  fn id(&self) -> &str { &self.id }

  fn haystack(&self) -> Vec<&str> {
    vec![self.nombre.as_str(), self.direccion.as_str(), self.responsable.as_str()]
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::normalize_collection;

  #[test]
  fn workplace_accepts_business_name() {
    let raw = json!({ "id": 3, "razonSocial": "Cantina El Faro", "giro": { "nombre": "Bar" } });
    let w = Workplace::from_raw(&raw);
    assert_eq!(w.nombre, "Cantina El Faro");
    assert_eq!(w.giro, "Bar");
    assert_eq!(w.telefono, "");
  }

  #[test]
  fn laboratory_list_under_english_key() {
    let raw = json!({
      "laboratories": [{
        "id": 1,
        "nombre": "Laboratorio Central",
        "direccion": "Av. Juárez 10",
        "telefono": "3310000000",
        "activo": true
      }]
    });
    let labs: Vec<Laboratory> = normalize_collection(&raw);
    assert_eq!(labs, vec![Laboratory {
      id:          "1".into(),
      nombre:      "Laboratorio Central".into(),
      direccion:   "Av. Juárez 10".into(),
      telefono:    "3310000000".into(),
      responsable: String::new(),
      activo:      true,
    }]);
  }
}
