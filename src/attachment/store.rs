//! Defines the attachment store trait.

use async_trait::async_trait;

use crate::Error;

/// Handles upload, deletion, and public addressing of attachment blobs.
///
/// Implementations must be safe for concurrent use; a single shared instance
/// is injected into the record service at startup.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Store `bytes` under `key`.
    ///
    /// # Errors
    /// Returns [Error::AttachmentStorage] if the blob could not be written.
    async fn upload(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), Error>;

    /// Remove the blob stored under `key`.
    ///
    /// # Errors
    /// Returns [Error::AttachmentStorage] if the blob could not be removed.
    /// Callers treat deletion failure as non-fatal and log it.
    async fn delete(&self, key: &str) -> Result<(), Error>;

    /// The URL from which the blob stored under `key` can be fetched.
    fn public_url(&self, key: &str) -> String;
}
