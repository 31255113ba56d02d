//! Input validation.
//!
//! Raw request input arrives as structs of optional strings. Each has a
//! `validate` method that either produces the typed value used by the rest of
//! the system or a [`ValidationError`] naming every offending field. Missing
//! and whitespace-only values are treated alike.

use std::fmt;

use thiserror::Error;

/// One or more request fields were missing, blank, or malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
  /// Names of fields that were missing or blank.
  pub missing: Vec<&'static str>,
  /// Fields that were present but unacceptable, with a reason.
  pub invalid: Vec<(&'static str, String)>,
}

impl ValidationError {
  pub fn missing(field: &'static str) -> Self {
    Self {
      missing: vec![field],
      invalid: Vec::new(),
    }
  }

  pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
    Self {
      missing: Vec::new(),
      invalid: vec![(field, reason.into())],
    }
  }

  /// All field names mentioned by this error, missing ones first.
  pub fn fields(&self) -> Vec<&'static str> {
    self
      .missing
      .iter()
      .copied()
      .chain(self.invalid.iter().map(|(f, _)| *f))
      .collect()
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut parts = Vec::new();
    if !self.missing.is_empty() {
      parts.push(format!("missing required fields: {}", self.missing.join(", ")));
    }
    for (field, reason) in &self.invalid {
      parts.push(format!("{field}: {reason}"));
    }
    f.write_str(&parts.join("; "))
  }
}

/// Accumulates field checks so a single [`ValidationError`] reports every
/// problem at once.
#[derive(Debug, Default)]
pub struct Checker {
  missing: Vec<&'static str>,
  invalid: Vec<(&'static str, String)>,
}

impl Checker {
  pub fn new() -> Self { Self::default() }

  /// Require a non-blank value; returns it trimmed.
  pub fn required(&mut self, field: &'static str, value: Option<&str>) -> String {
    match value.map(str::trim) {
      Some(v) if !v.is_empty() => v.to_owned(),
      _ => {
        self.missing.push(field);
        String::new()
      }
    }
  }

  /// Like [`Checker::required`] but returns the value untouched; passwords
  /// keep any surrounding whitespace.
  pub fn secret(&mut self, field: &'static str, value: Option<&str>) -> String {
    match value {
      Some(v) if !v.trim().is_empty() => v.to_owned(),
      _ => {
        self.missing.push(field);
        String::new()
      }
    }
  }

  /// An optional value: blank collapses to `None`, otherwise trimmed.
  pub fn optional(&self, value: Option<&str>) -> Option<String> {
    value
      .map(str::trim)
      .filter(|v| !v.is_empty())
      .map(str::to_owned)
  }

  /// Record a missing field directly, for requirements spanning several
  /// inputs.
  pub fn missing(&mut self, field: &'static str) { self.missing.push(field); }

  /// Record a present-but-unacceptable field.
  pub fn reject(&mut self, field: &'static str, reason: impl Into<String>) {
    self.invalid.push((field, reason.into()));
  }

  pub fn finish(self) -> Result<(), ValidationError> {
    if self.missing.is_empty() && self.invalid.is_empty() {
      Ok(())
    } else {
      Err(ValidationError {
        missing: self.missing,
        invalid: self.invalid,
      })
    }
  }
}

/// Trim and lower-case; used for case-insensitive identifiers.
pub fn fold(value: &str) -> String { value.trim().to_lowercase() }
