//! The rescue-assignment ledger: who rescued which animal, for which
//! organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::animal::AnimalSummary;

/// One rescue event. At most one exists per animal (enforced by the store).
/// Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescueAssignment {
  #[serde(rename = "_id")]
  pub assignment_id: Uuid,
  #[serde(rename = "animal")]
  pub animal_id:     Uuid,
  #[serde(rename = "rescuer")]
  pub rescuer_id:    Uuid,
  #[serde(rename = "org")]
  pub org_id:        Uuid,
  pub rescued_at:    DateTime<Utc>,
}

/// Everything a rescuer has rescued.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescuerTally {
  pub animals: Vec<AnimalSummary>,
  pub total:   usize,
}

impl From<Vec<AnimalSummary>> for RescuerTally {
  fn from(animals: Vec<AnimalSummary>) -> Self {
    let total = animals.len();
    Self { animals, total }
  }
}

/// The organization fields shown alongside its rescues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgSummary {
  #[serde(rename = "_id")]
  pub org_id:   Uuid,
  pub org_name: String,
  pub location: String,
}

/// One entry of an organization's rescue history, denormalised for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgRescue {
  #[serde(rename = "_id")]
  pub assignment_id:        Uuid,
  #[serde(rename = "rescuer")]
  pub rescuer_id:           Uuid,
  pub rescued_at:           DateTime<Utc>,
  pub animal_details:       AnimalSummary,
  pub animal_rescue_by_org: OrgSummary,
}
