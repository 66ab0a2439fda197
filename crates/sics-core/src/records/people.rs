//! Person-derived records: affiliates, doctors, and user accounts.

use serde::{Deserialize, Serialize};

use super::Person;
use crate::{
  envelope::{EntityKind, Record},
  fields::Fields,
};

const PERSON_ID: &[&str] = &["persona.id", "persona_id", "id_persona"];

// ─── Affiliate ───────────────────────────────────────────────────────────────

/// A worker registered for sanitary control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affiliate {
  pub id:                String,
  pub persona:           Person,
  pub numero_afiliacion: String,
  pub lugar_trabajo_id:  String,
  /// Workplace display name, when the backend embeds or flattens it.
  pub lugar_trabajo:     String,
  pub estatus:           String,
  pub activo:            bool,
}

impl Record for Affiliate {
  const KIND: EntityKind = EntityKind::Affiliate;

  fn from_fields(f: &Fields<'_>) -> Self {
    Self {
      id:                f.string(&["id", "id_afiliado", "afiliado_id"]),
      persona:           Person::read(f, PERSON_ID),
      numero_afiliacion: f.string(&["numero_afiliacion", "no_afiliacion", "num_afiliado"]),
      lugar_trabajo_id:  f.string(&["lugar_trabajo.id", "lugar_trabajo_id", "id_lugar_trabajo"]),
      lugar_trabajo:     f.string(&["lugar_trabajo.nombre", "lugar_trabajo", "nombre_lugar_trabajo"]),
      estatus:           f.string(&["estatus", "estado"]),
      activo:            f.flag(&["activo", "active"]),
    }
  }

  fn id(&self) -> &str { &self.id }

  fn haystack(&self) -> Vec<&str> {
    let mut hay = self.persona.search_fields().to_vec();
    hay.extend([self.numero_afiliacion.as_str(), self.lugar_trabajo.as_str()]);
    hay
  }
}

// ─── Doctor ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
  pub id:                 String,
  pub persona:            Person,
  pub cedula_profesional: String,
  pub especialidad:       String,
  pub activo:             bool,
}

impl Record for Doctor {
  const KIND: EntityKind = EntityKind::Doctor;

  fn from_fields(f: &Fields<'_>) -> Self {
    Self {
      id:                 f.string(&["id", "id_medico", "medico_id"]),
      persona:            Person::read(f, PERSON_ID),
      cedula_profesional: f.string(&["cedula_profesional", "cedula"]),
      especialidad:       f.string(&["especialidad", "especialidad.nombre"]),
      activo:             f.flag(&["activo", "active"]),
    }
  }

  fn id(&self) -> &str { &self.id }

  fn haystack(&self) -> Vec<&str> {
    let mut hay = self.persona.search_fields().to_vec();
    hay.extend([self.cedula_profesional.as_str(), self.especialidad.as_str()]);
    hay
  }
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A system account, linked to the person who owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:       String,
  pub username: String,
  pub correo:   String,
  /// Role display name.
  pub rol:      String,
  pub activo:   bool,
  pub persona:  Person,
}

impl Record for User {
  const KIND: EntityKind = EntityKind::User;

  fn from_fields(f: &Fields<'_>) -> Self {
    Self {
      id:       f.string(&["id", "id_usuario", "_id"]),
      username: f.string(&["username", "nombre_usuario", "usuario"]),
      correo:   f.string(&["correo", "email", "persona.correo", "persona.email"]),
      rol:      f.string(&["rol.nombre", "rol.name", "rol", "role"]),
      activo:   f.flag(&["activo", "active"]),
      persona:  Person::read(f, PERSON_ID),
    }
  }

  fn id(&self) -> &str { &self.id }

  fn haystack(&self) -> Vec<&str> {
    let mut hay = vec![self.username.as_str(), self.correo.as_str(), self.rol.as_str()];
    hay.extend(self.persona.search_fields());
    hay
  }
}
