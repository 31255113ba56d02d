//! Request-body helpers: the multipart [`FormData`] extractor and path-id
//! parsing.

use std::collections::HashMap;

use axum::extract::{FromRequest, Multipart, Request};
use rescue_core::{media::Upload, validate::ValidationError};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ApiError;

/// A fully buffered `multipart/form-data` body: text fields by name, and file
/// fields by name. A file part with no content counts as absent.
#[derive(Debug, Default)]
pub struct FormData {
  fields: HashMap<String, String>,
  files:  HashMap<String, Upload>,
}

impl FormData {
  /// Deserialise the text fields into a form struct.
  pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
    let object = self
      .fields
      .iter()
      .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
      .collect::<serde_json::Map<_, _>>();
    serde_json::from_value(serde_json::Value::Object(object))
      .map_err(|e| ApiError::InvalidInput(e.to_string()))
  }

  /// Remove and return the named file, failing as a missing field.
  pub fn take_file(&mut self, field: &'static str) -> Result<Upload, ApiError> {
    self
      .files
      .remove(field)
      .ok_or_else(|| ValidationError::missing(field).into())
  }
}

impl<S: Send + Sync> FromRequest<S> for FormData {
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let mut multipart = Multipart::from_request(req, state).await?;
    let mut form = FormData::default();

    while let Some(field) = multipart.next_field().await? {
      let Some(name) = field.name().map(str::to_owned) else {
        continue;
      };
      match field.file_name().map(str::to_owned) {
        Some(file_name) => {
          let data = field.bytes().await?;
          if !data.is_empty() {
            form.files.insert(name, Upload { file_name: Some(file_name), data });
          }
        }
        None => {
          form.fields.insert(name, field.text().await?);
        }
      }
    }
    Ok(form)
  }
}

/// Parse a path segment as a record id.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw).map_err(|_| ApiError::InvalidInput(format!("invalid {what} id: {raw}")))
}
