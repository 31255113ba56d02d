//! Accounts: the three actor kinds sharing one credential/session model.
//!
//! Informants, rescuers and organizations differ only in their [`Profile`];
//! credentials, refresh-token state and sanitisation are common to all of
//! them and live on [`Account`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::validate::{Checker, ValidationError, fold};

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The actor kind an account belongs to. Each kind is an independent
/// collection: uniqueness of email/phone/handle is scoped to the kind.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AccountKind {
  Informant,
  Rescuer,
  Organization,
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InformantProfile {
  pub full_name: String,
  /// Lower-cased; unique among informants.
  pub username:  String,
  pub avatar:    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescuerProfile {
  /// Unique among rescuers.
  pub rescuer_name: String,
  pub avatar:       String,
  /// The organization this rescuer works for.
  #[serde(rename = "org")]
  pub org_id:       Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationProfile {
  pub org_name: String,
  pub location: String,
  pub logo:     String,
}

/// Per-kind account data. The variant tag doubles as the account kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Profile {
  Informant(InformantProfile),
  Rescuer(RescuerProfile),
  Organization(OrganizationProfile),
}

impl Profile {
  pub fn kind(&self) -> AccountKind {
    match self {
      Self::Informant(_) => AccountKind::Informant,
      Self::Rescuer(_) => AccountKind::Rescuer,
      Self::Organization(_) => AccountKind::Organization,
    }
  }

  /// Human-readable name carried in access-token claims.
  pub fn display_name(&self) -> &str {
    match self {
      Self::Informant(p) => &p.full_name,
      Self::Rescuer(p) => &p.rescuer_name,
      Self::Organization(p) => &p.org_name,
    }
  }

  /// The kind-specific unique handle, if the kind has one.
  pub fn handle(&self) -> Option<&str> {
    match self {
      Self::Informant(p) => Some(&p.username),
      Self::Rescuer(p) => Some(&p.rescuer_name),
      Self::Organization(_) => None,
    }
  }

  /// The avatar or logo URL.
  pub fn image(&self) -> &str {
    match self {
      Self::Informant(p) => &p.avatar,
      Self::Rescuer(p) => &p.avatar,
      Self::Organization(p) => &p.logo,
    }
  }

  /// The owning organization of a rescuer.
  pub fn org_id(&self) -> Option<Uuid> {
    match self {
      Self::Rescuer(p) => Some(p.org_id),
      _ => None,
    }
  }
}

// ─── Account ─────────────────────────────────────────────────────────────────

/// A stored account, including credential and session state.
///
/// Never serialised directly; use [`Account::view`] for anything that leaves
/// the process.
#[derive(Debug, Clone)]
pub struct Account {
  pub account_id:    Uuid,
  /// Lower-cased; unique within the kind.
  pub email:         String,
  /// Unique within the kind.
  pub phone_number:  String,
  /// argon2 PHC string.
  pub password_hash: String,
  /// The single live refresh token, cleared on logout.
  pub refresh_token: Option<String>,
  pub profile:       Profile,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Account {
  pub fn kind(&self) -> AccountKind { self.profile.kind() }

  /// The sanitised projection: no password hash, no refresh token.
  pub fn view(&self) -> AccountView {
    AccountView {
      account_id:   self.account_id,
      email:        self.email.clone(),
      phone_number: self.phone_number.clone(),
      profile:      self.profile.clone(),
      created_at:   self.created_at,
      updated_at:   self.updated_at,
    }
  }
}

/// What clients see of an account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
  #[serde(rename = "_id")]
  pub account_id:   Uuid,
  pub email:        String,
  pub phone_number: String,
  #[serde(flatten)]
  pub profile:      Profile,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// Input to [`crate::store::RescueStore::create_account`]. Timestamps and the
/// id are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub email:         String,
  pub phone_number:  String,
  pub password_hash: String,
  pub profile:       Profile,
}

// ─── Registration ────────────────────────────────────────────────────────────

/// Kind-specific registration data, before the image has been stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileDetails {
  Informant { full_name: String, username: String },
  Rescuer { rescuer_name: String, org_id: Uuid },
  Organization { org_name: String, location: String },
}

impl ProfileDetails {
  /// Complete the profile with the stored avatar/logo URL.
  pub fn with_image(self, image: String) -> Profile {
    match self {
      Self::Informant { full_name, username } => {
        Profile::Informant(InformantProfile { full_name, username, avatar: image })
      }
      Self::Rescuer { rescuer_name, org_id } => {
        Profile::Rescuer(RescuerProfile { rescuer_name, avatar: image, org_id })
      }
      Self::Organization { org_name, location } => {
        Profile::Organization(OrganizationProfile { org_name, location, logo: image })
      }
    }
  }
}

/// A validated registration; the password is still in plain text.
#[derive(Debug, Clone)]
pub struct Registration {
  pub email:        String,
  pub phone_number: String,
  pub password:     String,
  pub details:      ProfileDetails,
}

fn check_email(c: &mut Checker, value: Option<&str>) -> String {
  let email = fold(&c.required("email", value));
  if !email.is_empty() && !looks_like_email(&email) {
    c.reject("email", "not a valid email address");
  }
  email
}

fn looks_like_email(s: &str) -> bool {
  match s.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty() && !domain.is_empty() && !s.contains(char::is_whitespace)
    }
    None => false,
  }
}

/// Raw informant sign-up fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InformantForm {
  pub full_name:    Option<String>,
  pub username:     Option<String>,
  pub phone_number: Option<String>,
  pub email:        Option<String>,
  pub password:     Option<String>,
}

impl InformantForm {
  pub fn validate(&self) -> Result<Registration, ValidationError> {
    let mut c = Checker::new();
    let full_name = c.required("fullName", self.full_name.as_deref());
    let username = fold(&c.required("username", self.username.as_deref()));
    let phone_number = c.required("phoneNumber", self.phone_number.as_deref());
    let email = check_email(&mut c, self.email.as_deref());
    let password = c.secret("password", self.password.as_deref());
    c.finish()?;

    Ok(Registration {
      email,
      phone_number,
      password,
      details: ProfileDetails::Informant { full_name, username },
    })
  }
}

/// Raw organization sign-up fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationForm {
  pub org_name:     Option<String>,
  pub phone_number: Option<String>,
  pub location:     Option<String>,
  pub email:        Option<String>,
  pub password:     Option<String>,
}

impl OrganizationForm {
  pub fn validate(&self) -> Result<Registration, ValidationError> {
    let mut c = Checker::new();
    let org_name = c.required("orgName", self.org_name.as_deref());
    let phone_number = c.required("phoneNumber", self.phone_number.as_deref());
    let location = c.required("location", self.location.as_deref());
    let email = check_email(&mut c, self.email.as_deref());
    let password = c.secret("password", self.password.as_deref());
    c.finish()?;

    Ok(Registration {
      email,
      phone_number,
      password,
      details: ProfileDetails::Organization { org_name, location },
    })
  }
}

/// Raw fields an organization submits when adding a rescuer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescuerForm {
  pub rescuer_name: Option<String>,
  pub phone_number: Option<String>,
  pub email:        Option<String>,
  pub password:     Option<String>,
}

impl RescuerForm {
  pub fn validate(&self, org_id: Uuid) -> Result<Registration, ValidationError> {
    let mut c = Checker::new();
    let rescuer_name = c.required("rescuerName", self.rescuer_name.as_deref());
    let phone_number = c.required("phoneNumber", self.phone_number.as_deref());
    let email = check_email(&mut c, self.email.as_deref());
    let password = c.secret("password", self.password.as_deref());
    c.finish()?;

    Ok(Registration {
      email,
      phone_number,
      password,
      details: ProfileDetails::Rescuer { rescuer_name, org_id },
    })
  }
}

// ─── Login ───────────────────────────────────────────────────────────────────

/// How an account is looked up at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
  Email(String),
  Username(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
  pub email:    Option<String>,
  pub username: Option<String>,
  pub password: Option<String>,
}

impl LoginForm {
  /// Informants may identify by username or email; the other kinds only by
  /// email.
  pub fn validate(
    &self,
    kind: AccountKind,
  ) -> Result<(Credential, String), ValidationError> {
    let mut c = Checker::new();
    let email = c.optional(self.email.as_deref()).map(|e| fold(&e));
    let username = match kind {
      AccountKind::Informant => c.optional(self.username.as_deref()).map(|u| fold(&u)),
      _ => None,
    };

    let missing_field = match kind {
      AccountKind::Informant => "username or email",
      _ => "email",
    };
    let credential = email
      .map(Credential::Email)
      .or_else(|| username.map(Credential::Username));
    if credential.is_none() {
      c.missing(missing_field);
    }
    let password = c.secret("password", self.password.as_deref());
    c.finish()?;

    credential
      .map(|cred| (cred, password))
      .ok_or_else(|| ValidationError::missing(missing_field))
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeForm {
  pub old_password: Option<String>,
  pub new_password: Option<String>,
}

impl PasswordChangeForm {
  /// Returns `(old, new)`.
  pub fn validate(&self) -> Result<(String, String), ValidationError> {
    let mut c = Checker::new();
    let old = c.secret("oldPassword", self.old_password.as_deref());
    let new = c.secret("newPassword", self.new_password.as_deref());
    c.finish()?;
    Ok((old, new))
  }
}
