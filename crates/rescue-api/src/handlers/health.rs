//! Liveness check.

use serde_json::{Value, json};

use crate::reply::Reply;

/// `GET /healthcheck`
pub async fn handler() -> Reply<Value> {
  Reply::ok(
    json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }),
    "service is healthy",
  )
}
