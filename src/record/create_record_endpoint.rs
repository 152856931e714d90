//! Defines the endpoint for creating a new record.

use axum::{
    Json,
    extract::{FromRef, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState, Error,
    record::{form::parse_record_form, service::RecordService},
};

/// The state needed to create a record.
#[derive(Clone)]
pub struct CreateRecordState {
    /// The service coordinating the ledger database and attachment store.
    pub record_service: RecordService,
}

impl FromRef<AppState> for CreateRecordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            record_service: state.record_service.clone(),
        }
    }
}

/// A route handler for creating a new record from a multipart form,
/// uploading the attached image if one was sent.
pub async fn create_record_endpoint(
    State(state): State<CreateRecordState>,
    form: Multipart,
) -> Result<impl IntoResponse, Error> {
    let form = parse_record_form(form).await?;

    let record = state
        .record_service
        .create(form.fields, form.attachment)
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}
