//! Implements a filesystem-backed attachment store.

use std::{io, path::PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::{Error, attachment::AttachmentStore};

/// Stores attachment blobs as files in a flat directory.
///
/// Blobs are addressed by their storage key and served publicly by the HTTP
/// layer, which mounts the directory under `base_url`.
#[derive(Debug, Clone)]
pub struct FilesystemAttachmentStore {
    base_dir: PathBuf,
    base_url: String,
}

impl FilesystemAttachmentStore {
    /// Create a store writing to `base_dir`, creating the directory if
    /// needed. `base_url` is the public URL prefix the directory is served
    /// under, e.g. `/attachments`.
    ///
    /// # Errors
    /// Returns an error if the blob directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>, base_url: &str) -> io::Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;

        Ok(Self {
            base_dir,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Resolve `key` to a path inside the blob directory.
    ///
    /// Keys are generated flat, so anything with a path separator or parent
    /// component is rejected rather than resolved outside the directory.
    fn blob_path(&self, key: &str) -> Result<PathBuf, Error> {
        if key.is_empty() || key == ".." || key.contains('/') || key.contains('\\') {
            return Err(Error::AttachmentStorage(format!(
                "invalid attachment key \"{key}\""
            )));
        }

        Ok(self.base_dir.join(key))
    }
}

#[async_trait]
impl AttachmentStore for FilesystemAttachmentStore {
    async fn upload(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), Error> {
        let path = self.blob_path(key)?;
        tracing::debug!(
            key,
            content_type,
            size = bytes.len(),
            "writing attachment blob"
        );

        fs::write(&path, bytes)
            .await
            .map_err(|error| Error::AttachmentStorage(format!("could not write {key}: {error}")))
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let path = self.blob_path(key)?;
        tracing::debug!(key, "deleting attachment blob");

        fs::remove_file(&path)
            .await
            .map_err(|error| Error::AttachmentStorage(format!("could not delete {key}: {error}")))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url)
    }
}
