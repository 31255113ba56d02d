//! Error types for `rescue-media-fs`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("empty upload")]
  Empty,

  /// The URL does not name a file served by this store.
  #[error("not a media url of this store: {0}")]
  ForeignUrl(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
