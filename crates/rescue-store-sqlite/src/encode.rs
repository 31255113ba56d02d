//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so that lexical order is chronological. UUIDs are
//! hyphenated lowercase strings. Profiles are compact JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use rescue_core::{
  account::{Account, AccountKind, Profile},
  animal::{Animal, AnimalSummary, Gender},
  report::RescueReport,
  rescue::{OrgRescue, OrgSummary, RescueAssignment},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_kind(k: AccountKind) -> String { k.to_string() }

pub fn decode_kind(s: &str) -> Result<AccountKind> {
  s.parse().map_err(|_| Error::UnknownValue {
    column: "kind",
    value:  s.to_owned(),
  })
}

pub fn encode_gender(g: Gender) -> String { g.to_string() }

pub fn decode_gender(s: &str) -> Result<Gender> {
  s.parse().map_err(|_| Error::UnknownValue {
    column: "gender",
    value:  s.to_owned(),
  })
}

// ─── Profile ─────────────────────────────────────────────────────────────────

pub fn encode_profile(p: &Profile) -> Result<String> { Ok(serde_json::to_string(p)?) }

pub fn decode_profile(s: &str) -> Result<Profile> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const ACCOUNT_COLUMNS: &str = "account_id, kind, email, phone_number, \
                                   password_hash, refresh_token, profile_json, \
                                   created_at, updated_at";

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:    String,
  pub kind:          String,
  pub email:         String,
  pub phone_number:  String,
  pub password_hash: String,
  pub refresh_token: Option<String>,
  pub profile_json:  String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawAccount {
  /// Read a row selected with [`ACCOUNT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:    row.get(0)?,
      kind:          row.get(1)?,
      email:         row.get(2)?,
      phone_number:  row.get(3)?,
      password_hash: row.get(4)?,
      refresh_token: row.get(5)?,
      profile_json:  row.get(6)?,
      created_at:    row.get(7)?,
      updated_at:    row.get(8)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    let kind = decode_kind(&self.kind)?;
    let profile = decode_profile(&self.profile_json)?;
    if profile.kind() != kind {
      return Err(Error::UnknownValue {
        column: "profile_json",
        value:  self.profile_json,
      });
    }
    Ok(Account {
      account_id: decode_uuid(&self.account_id)?,
      email: self.email,
      phone_number: self.phone_number,
      password_hash: self.password_hash,
      refresh_token: self.refresh_token,
      profile,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub const ANIMAL_COLUMNS: &str = "animal_id, animal_type, breed, age, gender, \
                                  health_status, location, animal_picture, \
                                  rescue_status, informant_id, created_at, \
                                  updated_at";

/// Raw values read directly from an `animals` row.
pub struct RawAnimal {
  pub animal_id:      String,
  pub animal_type:    String,
  pub breed:          Option<String>,
  pub age:            Option<u32>,
  pub gender:         String,
  pub health_status:  String,
  pub location:       String,
  pub animal_picture: String,
  pub rescue_status:  bool,
  pub informant_id:   String,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawAnimal {
  /// Read a row selected with [`ANIMAL_COLUMNS`], starting at column
  /// `offset`.
  pub fn from_row_at(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      animal_id:      row.get(offset)?,
      animal_type:    row.get(offset + 1)?,
      breed:          row.get(offset + 2)?,
      age:            row.get(offset + 3)?,
      gender:         row.get(offset + 4)?,
      health_status:  row.get(offset + 5)?,
      location:       row.get(offset + 6)?,
      animal_picture: row.get(offset + 7)?,
      rescue_status:  row.get(offset + 8)?,
      informant_id:   row.get(offset + 9)?,
      created_at:     row.get(offset + 10)?,
      updated_at:     row.get(offset + 11)?,
    })
  }

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Self::from_row_at(row, 0)
  }

  pub fn into_animal(self) -> Result<Animal> {
    Ok(Animal {
      animal_id:      decode_uuid(&self.animal_id)?,
      animal_type:    self.animal_type,
      breed:          self.breed,
      age:            self.age,
      gender:         decode_gender(&self.gender)?,
      health_status:  self.health_status,
      location:       self.location,
      animal_picture: self.animal_picture,
      rescue_status:  self.rescue_status,
      informant_id:   decode_uuid(&self.informant_id)?,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read from a `rescue_assignments` row.
pub struct RawAssignment {
  pub assignment_id: String,
  pub animal_id:     String,
  pub rescuer_id:    String,
  pub org_id:        String,
  pub rescued_at:    String,
}

impl RawAssignment {
  pub fn into_assignment(self) -> Result<RescueAssignment> {
    Ok(RescueAssignment {
      assignment_id: decode_uuid(&self.assignment_id)?,
      animal_id:     decode_uuid(&self.animal_id)?,
      rescuer_id:    decode_uuid(&self.rescuer_id)?,
      org_id:        decode_uuid(&self.org_id)?,
      rescued_at:    decode_dt(&self.rescued_at)?,
    })
  }
}

/// An assignment joined with its animal and the organization's profile.
pub struct RawOrgRescue {
  pub assignment: RawAssignment,
  pub animal:     RawAnimal,
  pub org_json:   String,
}

impl RawOrgRescue {
  pub fn into_org_rescue(self) -> Result<OrgRescue> {
    let assignment = self.assignment.into_assignment()?;
    let animal: AnimalSummary = self.animal.into_animal()?.summary();
    let org = match decode_profile(&self.org_json)? {
      Profile::Organization(p) => OrgSummary {
        org_id:   assignment.org_id,
        org_name: p.org_name,
        location: p.location,
      },
      _ => {
        return Err(Error::UnknownValue {
          column: "profile_json",
          value:  self.org_json,
        });
      }
    };
    Ok(OrgRescue {
      assignment_id:        assignment.assignment_id,
      rescuer_id:           assignment.rescuer_id,
      rescued_at:           assignment.rescued_at,
      animal_details:       animal,
      animal_rescue_by_org: org,
    })
  }
}

/// Raw strings read from a `rescue_reports` row.
pub struct RawReport {
  pub report_id:          String,
  pub animal_id:          String,
  pub org_id:             String,
  pub description:        String,
  pub rescued_animal_pic: String,
  pub created_at:         String,
}

impl RawReport {
  pub fn into_report(self) -> Result<RescueReport> {
    Ok(RescueReport {
      report_id:          decode_uuid(&self.report_id)?,
      animal_id:          decode_uuid(&self.animal_id)?,
      org_id:             decode_uuid(&self.org_id)?,
      description:        self.description,
      rescued_animal_pic: self.rescued_animal_pic,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}
