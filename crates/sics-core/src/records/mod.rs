//! Canonical records produced by the normalizer.
//!
//! Every field is total: strings default to `""`, flags to `false`, dates to
//! `None`. Field names follow the backend's vocabulary so they read the same
//! in both places.

mod clinical;
mod people;
mod person;
mod places;

pub use clinical::{Certificate, ClinicalExam, MedicalNote};
pub use people::{Affiliate, Doctor, User};
pub use person::Person;
pub use places::{Laboratory, Workplace};
