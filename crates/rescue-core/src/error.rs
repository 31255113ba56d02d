//! Error types for `rescue-core`.
//!
//! This is the domain taxonomy every backend error is converted into before
//! it reaches the HTTP layer.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::{account::AccountKind, validate::ValidationError};

/// The kind of record a [`Error::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
  Account(AccountKind),
  Animal,
  Report,
}

impl fmt::Display for Entity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Account(kind) => write!(f, "{kind}"),
      Self::Animal => f.write_str("animal"),
      Self::Report => f.write_str("rescue report"),
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("{entity} not found: {id}")]
  NotFound { entity: Entity, id: Uuid },

  #[error("animal {0} is already rescued")]
  AlreadyRescued(Uuid),

  /// A unique field (email, phone number, username, ...) is already taken.
  #[error("{0} is already taken")]
  Duplicate(String),

  #[error("a rescue report already exists for animal {0}")]
  ReportExists(Uuid),

  #[error("animal {animal_id} has no rescue recorded for organization {org_id}")]
  NoRescueRecord { animal_id: Uuid, org_id: Uuid },

  #[error("backend error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn not_found(entity: Entity, id: Uuid) -> Self {
    Self::NotFound { entity, id }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
