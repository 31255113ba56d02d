//! The media-store abstraction: turns uploaded files into durable URLs.
//!
//! Implemented by `rescue-media-fs`; the HTTP layer wraps calls in its retry
//! and timeout policy.

use std::future::Future;

use bytes::Bytes;

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct Upload {
  /// The client-supplied file name, used only to pick an extension.
  pub file_name: Option<String>,
  pub data:      Bytes,
}

impl Upload {
  /// The lower-cased extension of `file_name`, if it is a plain alphanumeric
  /// one.
  pub fn extension(&self) -> Option<String> {
    let name = self.file_name.as_deref()?;
    let (_, ext) = name.rsplit_once('.')?;
    (!ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
      .then(|| ext.to_ascii_lowercase())
  }
}

/// Abstraction over an external media host.
pub trait MediaStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist `upload` and return the URL it is reachable at.
  fn store(
    &self,
    upload: Upload,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;

  /// Remove the media behind `url`. Returns `false` if nothing was there.
  fn delete<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
