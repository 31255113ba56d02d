//! Local-disk media host for the rescue platform.
//!
//! [`DiskMediaStore`] writes each upload to a single flat directory and hands
//! back a URL under a configurable base path. Serving that directory is the
//! caller's responsibility (the server binary mounts it with `ServeDir`).

pub mod error;

pub use error::{Error, Result};

use std::path::PathBuf;

use rescue_core::media::{MediaStore, Upload};
use tracing::debug;
use uuid::Uuid;

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DiskMediaStore {
  root:     PathBuf,
  /// URL prefix without a trailing slash, e.g. `/media`.
  base_url: String,
}

impl DiskMediaStore {
  /// Create the store, creating `root` if it does not exist yet.
  pub async fn open(root: impl Into<PathBuf>, base_url: &str) -> Result<Self> {
    let root = root.into();
    tokio::fs::create_dir_all(&root).await?;
    Ok(Self {
      root,
      base_url: base_url.trim_end_matches('/').to_owned(),
    })
  }

  fn url_for(&self, name: &str) -> String { format!("{}/{name}", self.base_url) }

  /// Map a URL back to a path inside `root`. Only plain file names directly
  /// under the base URL are accepted.
  fn path_for(&self, url: &str) -> Result<PathBuf> {
    let name = url
      .strip_prefix(self.base_url.as_str())
      .and_then(|rest| rest.strip_prefix('/'))
      .ok_or_else(|| Error::ForeignUrl(url.to_owned()))?;

    let plain = !name.is_empty()
      && !name.starts_with('.')
      && name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if !plain {
      return Err(Error::ForeignUrl(url.to_owned()));
    }
    Ok(self.root.join(name))
  }
}

fn file_name(upload: &Upload) -> String {
  let id = Uuid::new_v4().simple();
  match upload.extension() {
    Some(ext) => format!("{id}.{ext}"),
    None => id.to_string(),
  }
}

impl MediaStore for DiskMediaStore {
  type Error = Error;

  async fn store(&self, upload: Upload) -> Result<String> {
    if upload.data.is_empty() {
      return Err(Error::Empty);
    }
    let name = file_name(&upload);
    tokio::fs::write(self.root.join(&name), &upload.data).await?;
    debug!(%name, bytes = upload.data.len(), "stored media");
    Ok(self.url_for(&name))
  }

  async fn delete<'a>(&'a self, url: &'a str) -> Result<bool> {
    let path = self.path_for(url)?;
    match tokio::fs::remove_file(&path).await {
      Ok(()) => {
        debug!(%url, "deleted media");
        Ok(true)
      }
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
      Err(e) => Err(e.into()),
    }
  }
}

#[cfg(test)]
mod tests {
  use bytes::Bytes;

  use super::*;

  async fn store() -> DiskMediaStore {
    let dir = std::env::temp_dir().join(format!("rescue-media-{}", Uuid::new_v4()));
    DiskMediaStore::open(dir, "/media/").await.unwrap()
  }

  fn upload(name: &str, data: &'static [u8]) -> Upload {
    Upload {
      file_name: Some(name.into()),
      data:      Bytes::from_static(data),
    }
  }

  #[tokio::test]
  async fn store_then_delete() {
    let s = store().await;
    let url = s.store(upload("dog.PNG", b"woof")).await.unwrap();
    assert!(url.starts_with("/media/"));
    assert!(url.ends_with(".png"));

    let path = s.path_for(&url).unwrap();
    assert_eq!(tokio::fs::read(&path).await.unwrap(), b"woof");

    assert!(s.delete(&url).await.unwrap());
    assert!(!s.delete(&url).await.unwrap());
  }

  #[tokio::test]
  async fn identical_uploads_get_distinct_files() {
    let s = store().await;
    let a = s.store(upload("a.jpg", b"same")).await.unwrap();
    let b = s.store(upload("b.jpg", b"same")).await.unwrap();
    assert_ne!(a, b);

    s.delete(&a).await.unwrap();
    assert!(tokio::fs::metadata(s.path_for(&b).unwrap()).await.is_ok());
  }

  #[tokio::test]
  async fn empty_upload_is_rejected() {
    let s = store().await;
    assert!(matches!(s.store(upload("x.png", b"")).await, Err(Error::Empty)));
  }

  #[tokio::test]
  async fn delete_rejects_urls_outside_the_store() {
    let s = store().await;
    for url in ["/media/../secret", "/other/file.png", "/media/", "/media/a/b.png"] {
      assert!(
        matches!(s.delete(url).await, Err(Error::ForeignUrl(_))),
        "accepted {url}"
      );
    }
  }
}
