//! Rescue reports, an organization's attestation that an animal was
//! rescued.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validate::{Checker, ValidationError};

/// Filed once per animal, by an organization with a recorded rescue of that
/// animal. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescueReport {
  #[serde(rename = "_id")]
  pub report_id:          Uuid,
  #[serde(rename = "animal")]
  pub animal_id:          Uuid,
  #[serde(rename = "org")]
  pub org_id:             Uuid,
  pub description:        String,
  pub rescued_animal_pic: String,
  pub created_at:         DateTime<Utc>,
}

/// Input to [`crate::store::RescueStore::file_report`].
#[derive(Debug, Clone)]
pub struct NewReport {
  pub animal_id:          Uuid,
  pub org_id:             Uuid,
  pub description:        String,
  pub rescued_animal_pic: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportForm {
  pub description: Option<String>,
}

impl ReportForm {
  /// Returns the trimmed description.
  pub fn validate(&self) -> Result<String, ValidationError> {
    let mut c = Checker::new();
    let description = c.required("description", self.description.as_deref());
    c.finish()?;
    Ok(description)
  }
}
