//! Clinical records: exams, medical notes, and sanitary certificates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  envelope::{EntityKind, Record},
  fields::Fields,
};

const AFFILIATE_ID: &[&str] = &["afiliado.id", "afiliado_id", "id_afiliado"];

// ─── Clinical exam ───────────────────────────────────────────────────────────

/// A laboratory exam taken by an affiliate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalExam {
  pub id:             String,
  pub afiliado_id:    String,
  pub laboratorio_id: String,
  pub tipo:           String,
  pub resultado:      String,
  pub observaciones:  String,
  pub fecha:          Option<NaiveDate>,
}

impl Record for ClinicalExam {
  const KIND: EntityKind = EntityKind::ClinicalExam;

  fn from_fields(f: &Fields<'_>) -> Self {
    Self {
      id:             f.string(&["id", "id_examen", "examen_id"]),
      afiliado_id:    f.string(AFFILIATE_ID),
      laboratorio_id: f.string(&["laboratorio.id", "laboratorio_id", "id_laboratorio"]),
      tipo:           f.string(&["tipo_examen.nombre", "tipo_examen", "tipo"]),
      resultado:      f.string(&["resultado", "resultados"]),
      observaciones:  f.string(&["observaciones", "notas"]),
      fecha:          f.date(&["fecha", "fecha_examen", "created_at"]),
    }
  }

  fn id(&self) -> &str { &self.id }

  fn haystack(&self) -> Vec<&str> {
    vec![self.tipo.as_str(), self.resultado.as_str(), self.observaciones.as_str()]
  }
}

// ─── Medical note ────────────────────────────────────────────────────────────

/// A doctor's note from an affiliate's consultation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalNote {
  pub id:          String,
  pub afiliado_id: String,
  pub medico_id:   String,
  pub motivo:      String,
  pub diagnostico: String,
  pub tratamiento: String,
  pub fecha:       Option<NaiveDate>,
}

impl Record for MedicalNote {
  const KIND: EntityKind = EntityKind::MedicalNote;

  fn from_fields(f: &Fields<'_>) -> Self {
    Self {
      id:          f.string(&["id", "id_nota", "nota_id"]),
      afiliado_id: f.string(AFFILIATE_ID),
      medico_id:   f.string(&["medico.id", "medico_id", "id_medico"]),
      motivo:      f.string(&["motivo", "motivo_consulta"]),
      diagnostico: f.string(&["diagnostico"]),
      tratamiento: f.string(&["tratamiento", "indicaciones"]),
      fecha:       f.date(&["fecha", "fecha_nota", "created_at"]),
    }
  }

  fn id(&self) -> &str { &self.id }

  fn haystack(&self) -> Vec<&str> {
    vec![self.motivo.as_str(), self.diagnostico.as_str(), self.tratamiento.as_str()]
  }
}

// ─── Certificate ─────────────────────────────────────────────────────────────

/// A sanitary certificate issued to an affiliate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
  pub id:                String,
  pub afiliado_id:       String,
  pub folio:             String,
  pub estatus:           String,
  /// Location of the scanned document, when one was uploaded.
  pub archivo:           String,
  pub fecha_expedicion:  Option<NaiveDate>,
  pub fecha_vencimiento: Option<NaiveDate>,
}

impl Certificate {
  /// A certificate without an expiry date never expires.
  pub fn is_expired(&self, on: NaiveDate) -> bool {
    self.fecha_vencimiento.is_some_and(|until| until < on)
  }
}

impl Record for Certificate {
  const KIND: EntityKind = EntityKind::Certificate;

  fn from_fields(f: &Fields<'_>) -> Self {
    Self {
      id:                f.string(&["id", "id_certificado", "certificado_id"]),
      afiliado_id:       f.string(AFFILIATE_ID),
      folio:             f.string(&["folio", "numero"]),
      estatus:           f.string(&["estatus", "estado"]),
      archivo:           f.string(&["archivo", "url", "imagen"]),
      fecha_expedicion:  f.date(&["fecha_expedicion", "fecha_emision", "created_at"]),
      fecha_vencimiento: f.date(&["fecha_vencimiento", "vigencia"]),
    }
  }

  fn id(&self) -> &str { &self.id }

  fn haystack(&self) -> Vec<&str> {
    vec![self.folio.as_str(), self.estatus.as_str()]
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::normalize_collection;

  #[test]
  fn exam_reads_nested_references() {
    let raw = json!({
      "id": 7,
      "afiliado": { "id": 15 },
      "laboratorio": { "id": 1, "nombre": "Central" },
      "tipoExamen": { "nombre": "VDRL" },
      "resultado": "negativo",
      "fecha": "2024-05-02T09:00:00Z"
    });
    let exam = ClinicalExam::from_raw(&raw);
    assert_eq!(exam.afiliado_id, "15");
    assert_eq!(exam.laboratorio_id, "1");
    assert_eq!(exam.tipo, "VDRL");
    assert_eq!(exam.fecha, NaiveDate::from_ymd_opt(2024, 5, 2));
    assert_eq!(exam.observaciones, "");
  }

  #[test]
  fn note_with_missing_fields_is_fully_defaulted() {
    let note = MedicalNote::from_raw(&json!({ "diagnostico": "Sano" }));
    assert_eq!(note, MedicalNote {
      diagnostico: "Sano".into(),
      ..MedicalNote::default()
    });
  }

  #[test]
  fn gallery_envelope_holds_certificates() {
    let raw = json!({
      "gallery": [
        { "id": 1, "folio": "C-001", "fechaVencimiento": "2024-12-31" },
        { "id": 2, "folio": "C-002" }
      ]
    });
    let certs: Vec<Certificate> = normalize_collection(&raw);
    assert_eq!(certs.len(), 2);

    let june = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    assert!(certs[0].is_expired(june));
    assert!(!certs[1].is_expired(june));
  }

  #[test]
  fn single_certificate_is_one_element_list() {
    let raw = json!({ "folio": "C-009", "afiliadoId": 4 });
    let certs: Vec<Certificate> = normalize_collection(&raw);
    assert_eq!(certs.len(), 1);
    assert_eq!(certs[0].afiliado_id, "4");
  }
}
