//! Calls to the media host, wrapped in a timeout-and-retry policy.
//!
//! Uploads sit on the request path and are retried. Deletes of replaced or
//! orphaned media are fire-and-forget: they run on a spawned task and a
//! failure is only logged.

use std::{sync::Arc, time::Duration};

use rescue_core::media::{MediaStore, Upload};
use tracing::{debug, warn};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy)]
pub struct MediaPolicy {
  /// Total attempts, including the first. At least one is always made.
  pub attempts: u32,
  /// Upper bound on a single attempt.
  pub timeout:  Duration,
  /// Delay before the second attempt; doubled after every further failure.
  pub backoff:  Duration,
}

/// Store `upload`, retrying transient failures.
pub async fn upload<M: MediaStore>(
  media: &M,
  policy: MediaPolicy,
  upload: Upload,
) -> Result<String, ApiError> {
  let attempts = policy.attempts.max(1);
  let mut delay = policy.backoff;

  for attempt in 1..=attempts {
    match tokio::time::timeout(policy.timeout, media.store(upload.clone())).await {
      Ok(Ok(url)) => return Ok(url),
      Ok(Err(e)) => warn!(attempt, error = %e, "media upload failed"),
      Err(_) => warn!(attempt, timeout = ?policy.timeout, "media upload timed out"),
    }
    if attempt < attempts {
      tokio::time::sleep(delay).await;
      delay = delay.saturating_mul(2);
    }
  }

  Err(ApiError::UploadFailed(format!(
    "file upload failed after {attempts} attempts"
  )))
}

/// Delete `url` in the background.
pub fn discard<M: MediaStore + 'static>(media: Arc<M>, url: String) {
  tokio::spawn(async move {
    match media.delete(&url).await {
      Ok(true) => debug!(%url, "discarded media"),
      Ok(false) => debug!(%url, "media already gone"),
      Err(e) => warn!(%url, error = %e, "failed to discard media"),
    }
  });
}
