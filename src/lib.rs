//! Ledgerkeep is a small ledger service for dated income/expense records
//! with optional photo attachments.
//!
//! Structured fields are persisted to SQLite and attachment blobs to a
//! pluggable attachment store; the library exposes a JSON REST API over the
//! record lifecycle (create, query, update, delete).

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use tokio::signal;

mod app_state;
mod attachment;
mod db;
mod endpoints;
mod record;
mod routing;

pub use app_state::AppState;
pub use attachment::{AttachmentStore, FilesystemAttachmentStore};
pub use db::initialize as initialize_db;
pub use record::{
    ALL_CATEGORIES, AttachmentUpload, Record, RecordBuilder, RecordFilter, RecordId,
    RecordService, RecordType,
};
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required form field was absent or empty.
    #[error("missing required field \"{0}\"")]
    MissingField(&'static str),

    /// A date string could not be parsed as a calendar date.
    ///
    /// Callers should pass in the string that caused the error.
    #[error("could not parse \"{0}\" as a date (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// The amount was not a non-negative, finite number.
    #[error("invalid amount \"{0}\": expected a non-negative number")]
    InvalidAmount(String),

    /// The record type was neither `INCOME` nor `EXPENSE`.
    #[error("invalid record type \"{0}\"")]
    InvalidRecordType(String),

    /// The multipart form could not be read.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a record that does not exist
    #[error("tried to update a record that is not in the database")]
    UpdateMissingRecord,

    /// Tried to delete a record that does not exist
    #[error("tried to delete a record that is not in the database")]
    DeleteMissingRecord,

    /// The attachment store failed to upload or delete a blob.
    ///
    /// Upload failures are fatal to the current operation; delete failures
    /// are logged by the caller and never propagated.
    #[error("attachment storage error: {0}")]
    AttachmentStorage(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = match self {
            Error::MissingField(_)
            | Error::InvalidDate(_)
            | Error::InvalidAmount(_)
            | Error::InvalidRecordType(_)
            | Error::MultipartError(_) => StatusCode::BAD_REQUEST,
            Error::NotFound | Error::UpdateMissingRecord | Error::DeleteMissingRecord => {
                StatusCode::NOT_FOUND
            }
            Error::AttachmentStorage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // Database errors are not intended to be shown to the client.
            Error::SqlError(_) | Error::DatabaseLockError => {
                tracing::error!("An unexpected error occurred: {}", self);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: "an internal error occurred".to_owned(),
                    }),
                )
                    .into_response();
            }
        };

        (
            status_code,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
