//! Orchestrates the record lifecycle across the ledger database and the
//! attachment store.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::{
    Error,
    attachment::{AttachmentStore, generate_attachment_key, key_from_public_url},
    record::{
        core::{
            Record, RecordBuilder, RecordId, create_record, delete_record, get_record,
            update_record,
        },
        filter::{RecordFilter, query_records},
    },
};

/// An attachment uploaded alongside a record's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentUpload {
    /// The filename as provided by the client; only its extension is kept.
    pub file_name: String,
    /// The MIME type declared by the client.
    pub content_type: String,
    /// The file contents.
    pub bytes: Vec<u8>,
}

/// Coordinates record writes across the ledger database and the attachment
/// store.
///
/// Constructed once at startup and shared by all requests. There is no
/// transaction spanning the two stores; instead writes follow an ordering
/// discipline: a new blob is always uploaded before any row references it,
/// and an old blob is deleted only after its replacement has been decided,
/// so a record is never left referencing a deleted blob with no
/// replacement. Blob deletion is best-effort: failures are logged and never
/// block the row operation.
#[derive(Clone)]
pub struct RecordService {
    db_connection: Arc<Mutex<Connection>>,
    attachments: Arc<dyn AttachmentStore>,
}

impl RecordService {
    /// Create a service over the shared database connection and attachment
    /// store.
    pub fn new(
        db_connection: Arc<Mutex<Connection>>,
        attachments: Arc<dyn AttachmentStore>,
    ) -> Self {
        Self {
            db_connection,
            attachments,
        }
    }

    /// Create a new record, uploading its attachment first if one was sent.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::AttachmentStorage] if the attachment upload fails; no row
    ///   is written in that case,
    /// - or [Error::SqlError] if the insert fails. A blob uploaded just
    ///   before a failed insert is left orphaned and logged, since no row
    ///   references it yet.
    pub async fn create(
        &self,
        fields: RecordBuilder,
        attachment: Option<AttachmentUpload>,
    ) -> Result<Record, Error> {
        let attachment_url = match &attachment {
            Some(upload) => Some(self.upload_blob(upload).await?),
            None => None,
        };

        let result = {
            let connection = self.lock_connection()?;
            create_record(fields.attachment_url(attachment_url.clone()), &connection)
        };

        if result.is_err()
            && let Some(url) = &attachment_url
        {
            tracing::warn!(%url, "record insert failed, attachment blob orphaned");
        }

        result
    }

    /// Update the record `id`, resolving its attachment.
    ///
    /// The new attachment reference is resolved by priority: uploaded bytes
    /// win, then `clear_attachment`, otherwise the existing reference is
    /// kept. When the old blob is replaced or cleared it is deleted from the
    /// attachment store after the new reference has been decided; a failed
    /// deletion is logged and the update still succeeds.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::UpdateMissingRecord] if `id` does not refer to a valid
    ///   record,
    /// - [Error::AttachmentStorage] if a new attachment fails to upload; the
    ///   record is left unchanged in that case,
    /// - or [Error::SqlError] if there is some other SQL error.
    pub async fn update(
        &self,
        id: RecordId,
        fields: RecordBuilder,
        attachment: Option<AttachmentUpload>,
        clear_attachment: bool,
    ) -> Result<Record, Error> {
        let current = {
            let connection = self.lock_connection()?;
            get_record(id, &connection).map_err(|error| match error {
                Error::NotFound => Error::UpdateMissingRecord,
                error => error,
            })?
        };

        let (attachment_url, replaces_old) = match (&attachment, clear_attachment) {
            (Some(upload), _) => (Some(self.upload_blob(upload).await?), true),
            (None, true) => (None, true),
            (None, false) => (current.attachment_url.clone(), false),
        };

        if replaces_old && let Some(old_url) = &current.attachment_url {
            self.delete_blob_best_effort(old_url).await;
        }

        let connection = self.lock_connection()?;
        update_record(id, &fields.attachment_url(attachment_url), &connection)
    }

    /// Delete the record `id`, cascading to its attachment blob.
    ///
    /// The blob deletion is attempted first and is best-effort; the row is
    /// removed regardless, since an orphaned blob is preferable to an
    /// undeletable record.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DeleteMissingRecord] if `id` does not refer to a valid
    ///   record,
    /// - or [Error::SqlError] if there is some other SQL error.
    pub async fn delete(&self, id: RecordId) -> Result<RecordId, Error> {
        let current = {
            let connection = self.lock_connection()?;
            get_record(id, &connection).map_err(|error| match error {
                Error::NotFound => Error::DeleteMissingRecord,
                error => error,
            })?
        };

        if let Some(url) = &current.attachment_url {
            self.delete_blob_best_effort(url).await;
        }

        let connection = self.lock_connection()?;
        delete_record(id, &connection)?;

        Ok(id)
    }

    /// Retrieve all records matching `filter`, newest first.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] if there is a SQL
    /// error.
    pub fn query(&self, filter: &RecordFilter) -> Result<Vec<Record>, Error> {
        let connection = self.lock_connection()?;

        query_records(filter, &connection)
    }

    async fn upload_blob(&self, upload: &AttachmentUpload) -> Result<String, Error> {
        let key = generate_attachment_key(&upload.file_name);
        self.attachments
            .upload(&key, &upload.bytes, &upload.content_type)
            .await?;

        Ok(self.attachments.public_url(&key))
    }

    async fn delete_blob_best_effort(&self, url: &str) {
        let Some(key) = key_from_public_url(url) else {
            tracing::warn!(url, "could not derive attachment key from stored URL");
            return;
        };

        if let Err(error) = self.attachments.delete(key).await {
            tracing::warn!(key, "could not delete attachment blob: {error}");
        }
    }

    fn lock_connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
    }
}
