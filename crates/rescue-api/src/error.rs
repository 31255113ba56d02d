//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is rendered in the same envelope as a success, with
//! `data: null`.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  extract::multipart::{MultipartError, MultipartRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use rescue_core::validate::ValidationError;
use thiserror::Error;
use tracing::error;

use crate::reply::Envelope;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  InvalidInput(String),

  /// Authentication failed. The message never says why.
  #[error("{0}")]
  Unauthorized(String),

  #[error("{0}")]
  Conflict(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  UploadFailed(String),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// The uniform rejection for any missing, invalid or foreign token.
  pub fn unauthorized() -> Self { Self::Unauthorized("unauthorized request".into()) }

  pub fn internal(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Internal(Box::new(e))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
      Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::UploadFailed(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

/// Convert any store error through the domain taxonomy.
pub fn store_err<E: Into<rescue_core::Error>>(e: E) -> ApiError { e.into().into() }

impl From<rescue_core::Error> for ApiError {
  fn from(e: rescue_core::Error) -> Self {
    use rescue_core::Error as Core;
    match e {
      Core::Validation(v) => v.into(),
      e @ (Core::NotFound { .. } | Core::NoRescueRecord { .. }) => {
        Self::NotFound(e.to_string())
      }
      e @ (Core::AlreadyRescued(_) | Core::Duplicate(_) | Core::ReportExists(_)) => {
        Self::Conflict(e.to_string())
      }
      e @ Core::Backend(_) => Self::internal(e),
    }
  }
}

impl From<ValidationError> for ApiError {
  fn from(e: ValidationError) -> Self { Self::InvalidInput(e.to_string()) }
}

// ─── Extractor rejections ────────────────────────────────────────────────────

impl From<JsonRejection> for ApiError {
  fn from(e: JsonRejection) -> Self { Self::InvalidInput(e.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(e: QueryRejection) -> Self { Self::InvalidInput(e.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(e: PathRejection) -> Self { Self::InvalidInput(e.body_text()) }
}

impl From<MultipartRejection> for ApiError {
  fn from(e: MultipartRejection) -> Self { Self::InvalidInput(e.body_text()) }
}

impl From<MultipartError> for ApiError {
  fn from(e: MultipartError) -> Self { Self::InvalidInput(e.body_text()) }
}

// ─── Response ────────────────────────────────────────────────────────────────

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      Self::Internal(e) => {
        error!(error = %e, "request failed");
        "internal server error".to_owned()
      }
      Self::UploadFailed(m) => {
        error!(reason = %m, "media upload failed");
        m.clone()
      }
      other => other.to_string(),
    };
    let body = Envelope {
      status: status.as_u16(),
      data: serde_json::Value::Null,
      message,
    };
    (status, Json(body)).into_response()
  }
}
