//! The `{status, data, message}` envelope every endpoint answers with.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub status:  u16,
  pub data:    T,
  pub message: String,
}

/// A successful response: an envelope plus any `Set-Cookie` headers.
#[derive(Debug)]
pub struct Reply<T> {
  status:  StatusCode,
  data:    T,
  message: String,
  cookies: Vec<String>,
}

impl<T: Serialize> Reply<T> {
  pub fn ok(data: T, message: impl Into<String>) -> Self {
    Self::new(StatusCode::OK, data, message)
  }

  pub fn created(data: T, message: impl Into<String>) -> Self {
    Self::new(StatusCode::CREATED, data, message)
  }

  fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
    Self { status, data, message: message.into(), cookies: Vec::new() }
  }

  pub fn with_cookies(mut self, cookies: impl IntoIterator<Item = String>) -> Self {
    self.cookies.extend(cookies);
    self
  }
}

impl<T: Serialize> IntoResponse for Reply<T> {
  fn into_response(self) -> Response {
    let body = Envelope {
      status:  self.status.as_u16(),
      data:    self.data,
      message: self.message,
    };
    let mut res = (self.status, Json(body)).into_response();
    for cookie in self.cookies {
      match HeaderValue::from_str(&cookie) {
        Ok(value) => {
          res.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => warn!(error = %e, "dropping malformed cookie"),
      }
    }
    res
  }
}
