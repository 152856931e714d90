//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, attachment::AttachmentStore, db::initialize, record::RecordService};

/// The state of the REST server.
///
/// The database connection and attachment store are constructed once at
/// startup and injected here; handlers receive them through [axum's
/// FromRef](axum::extract::FromRef) substates.
#[derive(Clone)]
pub struct AppState {
    /// The service coordinating record writes across both stores.
    pub record_service: RecordService,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection and an
    /// attachment store.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        attachment_store: Arc<dyn AttachmentStore>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            record_service: RecordService::new(connection, attachment_store),
        })
    }
}
