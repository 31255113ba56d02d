//! Animal records: reports of animals in need of rescue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::validate::{Checker, ValidationError, fold};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Gender {
  Male,
  Female,
}

/// A reported animal.
///
/// `rescue_status` starts `false` and is flipped to `true` exactly once, by
/// [`crate::store::RescueStore::assign_rescue`]. Nothing flips it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
  #[serde(rename = "_id")]
  pub animal_id:      Uuid,
  /// Lower-cased.
  pub animal_type:    String,
  /// Lower-cased.
  pub breed:          Option<String>,
  pub age:            Option<u32>,
  pub gender:         Gender,
  pub health_status:  String,
  pub location:       String,
  pub animal_picture: String,
  pub rescue_status:  bool,
  /// The informant who reported the animal.
  #[serde(rename = "informant")]
  pub informant_id:   Uuid,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl Animal {
  pub fn summary(&self) -> AnimalSummary {
    AnimalSummary {
      animal_id:      self.animal_id,
      animal_picture: self.animal_picture.clone(),
      animal_type:    self.animal_type.clone(),
      rescue_status:  self.rescue_status,
      location:       self.location.clone(),
      created_at:     self.created_at,
      updated_at:     self.updated_at,
    }
  }
}

/// The subset of animal fields shown in rescue listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalSummary {
  #[serde(rename = "_id")]
  pub animal_id:      Uuid,
  pub animal_picture: String,
  pub animal_type:    String,
  pub rescue_status:  bool,
  pub location:       String,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

/// Validated descriptive attributes of an animal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimalAttributes {
  pub animal_type:   String,
  pub breed:         Option<String>,
  pub age:           Option<u32>,
  pub gender:        Gender,
  pub health_status: String,
  pub location:      String,
}

/// Input to [`crate::store::RescueStore::create_animal`].
#[derive(Debug, Clone)]
pub struct NewAnimal {
  pub informant_id:   Uuid,
  pub attributes:     AnimalAttributes,
  pub animal_picture: String,
}

/// Raw fields of an animal submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalForm {
  pub animal_type:   Option<String>,
  pub breed:         Option<String>,
  pub age:           Option<String>,
  pub gender:        Option<String>,
  pub health_status: Option<String>,
  pub location:      Option<String>,
}

impl AnimalForm {
  pub fn validate(&self) -> Result<AnimalAttributes, ValidationError> {
    let mut c = Checker::new();
    let animal_type = fold(&c.required("animalType", self.animal_type.as_deref()));
    let breed = c.optional(self.breed.as_deref()).map(|b| fold(&b));
    let age = match c.optional(self.age.as_deref()) {
      Some(raw) => match raw.parse::<u32>() {
        Ok(age) => Some(age),
        Err(_) => {
          c.reject("age", "must be a non-negative integer");
          None
        }
      },
      None => None,
    };
    let gender_raw = c.required("gender", self.gender.as_deref());
    let gender = if gender_raw.is_empty() {
      None
    } else {
      match gender_raw.parse::<Gender>() {
        Ok(g) => Some(g),
        Err(_) => {
          c.reject("gender", "must be `male` or `female`");
          None
        }
      }
    };
    let health_status = c.required("healthStatus", self.health_status.as_deref());
    let location = c.required("location", self.location.as_deref());
    c.finish()?;

    let gender = gender.ok_or_else(|| ValidationError::missing("gender"))?;
    Ok(AnimalAttributes {
      animal_type,
      breed,
      age,
      gender,
      health_status,
      location,
    })
  }
}
