//! Defines the endpoint for deleting a record.

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use serde::Serialize;

use crate::{
    AppState, Error,
    record::{core::RecordId, service::RecordService},
};

/// The state needed to delete a record.
#[derive(Clone)]
pub struct DeleteRecordState {
    /// The service coordinating the ledger database and attachment store.
    pub record_service: RecordService,
}

impl FromRef<AppState> for DeleteRecordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            record_service: state.record_service.clone(),
        }
    }
}

/// Confirms which record was removed.
#[derive(Debug, Serialize)]
pub struct DeletedRecord {
    /// The ID of the record that was deleted.
    pub id: RecordId,
}

/// A route handler for deleting the record `record_id`, cascading to its
/// attachment blob.
pub async fn delete_record_endpoint(
    State(state): State<DeleteRecordState>,
    Path(record_id): Path<RecordId>,
) -> Result<Json<DeletedRecord>, Error> {
    let id = state.record_service.delete(record_id).await?;

    Ok(Json(DeletedRecord { id }))
}
