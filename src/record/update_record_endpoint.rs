//! Defines the endpoint for updating an existing record.

use axum::{
    Json,
    extract::{FromRef, Multipart, Path, State},
};

use crate::{
    AppState, Error,
    record::{Record, core::RecordId, form::parse_record_form, service::RecordService},
};

/// The state needed to update a record.
#[derive(Clone)]
pub struct UpdateRecordState {
    /// The service coordinating the ledger database and attachment store.
    pub record_service: RecordService,
}

impl FromRef<AppState> for UpdateRecordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            record_service: state.record_service.clone(),
        }
    }
}

/// A route handler for updating the record `record_id` from a multipart
/// form.
///
/// A newly uploaded image replaces the existing attachment; `clearImage`
/// removes it without a replacement; otherwise the attachment is kept.
pub async fn update_record_endpoint(
    State(state): State<UpdateRecordState>,
    Path(record_id): Path<RecordId>,
    form: Multipart,
) -> Result<Json<Record>, Error> {
    let form = parse_record_form(form).await?;

    let record = state
        .record_service
        .update(record_id, form.fields, form.attachment, form.clear_attachment)
        .await?;

    Ok(Json(record))
}
