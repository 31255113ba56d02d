//! The `RescueStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `rescue-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use serde::Deserialize;
use uuid::Uuid;

use crate::{
  account::{Account, AccountKind, Credential, NewAccount},
  animal::{Animal, NewAnimal},
  report::{NewReport, RescueReport},
  rescue::{OrgRescue, RescueAssignment, RescuerTally},
  validate::ValidationError,
};

// ─── Query type ──────────────────────────────────────────────────────────────

pub const DEFAULT_PAGE_SIZE: u32 = 7;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Parameters for [`RescueStore::list_animals`]. Results are always
/// newest-first.
///
/// Only built through [`AnimalQuery::new`], so `page >= 1` and
/// `1 <= page_size <= MAX_PAGE_SIZE` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimalQuery {
  rescue_status: Option<bool>,
  page:          u32,
  page_size:     u32,
}

impl AnimalQuery {
  pub fn new(
    rescue_status: Option<bool>,
    page: Option<u32>,
    page_size: Option<u32>,
  ) -> Result<Self, ValidationError> {
    let page = page.unwrap_or(1);
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page == 0 {
      return Err(ValidationError::invalid("page", "must be at least 1"));
    }
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
      return Err(ValidationError::invalid(
        "limit",
        format!("must be between 1 and {MAX_PAGE_SIZE}"),
      ));
    }
    Ok(Self { rescue_status, page, page_size })
  }

  pub fn rescue_status(&self) -> Option<bool> { self.rescue_status }

  /// 1-indexed.
  pub fn page(&self) -> u32 { self.page }

  pub fn page_size(&self) -> u32 { self.page_size }

  /// Number of records preceding this page.
  pub fn skip(&self) -> u64 {
    u64::from(self.page - 1) * u64::from(self.page_size)
  }
}

/// Raw pagination query-string parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalListParams {
  pub rescue_status: Option<bool>,
  pub page:          Option<u32>,
  pub limit:         Option<u32>,
}

impl AnimalListParams {
  pub fn validate(&self) -> Result<AnimalQuery, ValidationError> {
    AnimalQuery::new(self.rescue_status, self.page, self.limit)
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the platform's persistent state.
///
/// Backend errors must convert into [`crate::Error`] so callers can tell
/// "not found" and "conflict" apart from infrastructure failures without
/// knowing the backend.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait RescueStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Persist a new account. Fails with [`crate::Error::Duplicate`] if the
  /// email, phone number or handle is already used within the kind.
  fn create_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  /// Retrieve an account of `kind` by id. Returns `None` if not found.
  fn get_account(
    &self,
    kind: AccountKind,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Look an account up by its login credential.
  fn find_account<'a>(
    &'a self,
    kind: AccountKind,
    credential: &'a Credential,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  /// Overwrite (or with `None`, clear) the stored refresh token.
  fn set_refresh_token(
    &self,
    kind: AccountKind,
    id: Uuid,
    token: Option<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace the stored refresh token only if it still equals `expected`.
  /// Returns `false` if it did not (rotated, cleared, or unknown account).
  fn rotate_refresh_token(
    &self,
    kind: AccountKind,
    id: Uuid,
    expected: String,
    replacement: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn set_password_hash(
    &self,
    kind: AccountKind,
    id: Uuid,
    password_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace the avatar/logo URL and return the updated account together
  /// with the previous URL.
  fn replace_image(
    &self,
    kind: AccountKind,
    id: Uuid,
    url: String,
  ) -> impl Future<Output = Result<(Account, String), Self::Error>> + Send + '_;

  /// All rescuers affiliated with `org_id`, in creation order.
  fn list_rescuers(
    &self,
    org_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Account>, Self::Error>> + Send + '_;

  /// Delete a rescuer belonging to `org_id`. Returns the deleted record, or
  /// `None` if no such rescuer exists in that organization.
  fn delete_rescuer(
    &self,
    org_id: Uuid,
    rescuer_id: Uuid,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  // ── Animal registry ───────────────────────────────────────────────────

  /// Persist a new, unrescued animal.
  fn create_animal(
    &self,
    input: NewAnimal,
  ) -> impl Future<Output = Result<Animal, Self::Error>> + Send + '_;

  fn get_animal(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Animal>, Self::Error>> + Send + '_;

  /// One page of animals, newest first, optionally filtered by status.
  fn list_animals(
    &self,
    query: AnimalQuery,
  ) -> impl Future<Output = Result<Vec<Animal>, Self::Error>> + Send + '_;

  /// Every animal reported by `informant_id`, in insertion order.
  fn list_animals_by_informant(
    &self,
    informant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Animal>, Self::Error>> + Send + '_;

  // ── Rescue ledger ─────────────────────────────────────────────────────

  /// Mark an animal rescued and record the assignment, atomically.
  ///
  /// Fails with [`crate::Error::NotFound`] if the animal does not exist and
  /// with [`crate::Error::AlreadyRescued`] if it was already rescued; in
  /// both cases nothing is written. Concurrent calls for the same animal
  /// produce exactly one success.
  fn assign_rescue(
    &self,
    animal_id: Uuid,
    rescuer_id: Uuid,
    org_id: Uuid,
  ) -> impl Future<Output = Result<RescueAssignment, Self::Error>> + Send + '_;

  fn list_rescued_by_rescuer(
    &self,
    rescuer_id: Uuid,
  ) -> impl Future<Output = Result<RescuerTally, Self::Error>> + Send + '_;

  fn list_rescued_by_org(
    &self,
    org_id: Uuid,
  ) -> impl Future<Output = Result<Vec<OrgRescue>, Self::Error>> + Send + '_;

  // ── Rescue reports ────────────────────────────────────────────────────

  /// File the report for an animal.
  ///
  /// Fails with [`crate::Error::NotFound`] if the animal is unknown, with
  /// [`crate::Error::NoRescueRecord`] if the organization has not rescued
  /// it, and with [`crate::Error::ReportExists`] if it already has a report.
  fn file_report(
    &self,
    input: NewReport,
  ) -> impl Future<Output = Result<RescueReport, Self::Error>> + Send + '_;

  fn get_report(
    &self,
    animal_id: Uuid,
  ) -> impl Future<Output = Result<Option<RescueReport>, Self::Error>> + Send + '_;
}
