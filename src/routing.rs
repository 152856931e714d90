//! Application router configuration for the records API.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, put},
};

use crate::{
    AppState, endpoints,
    record::{
        create_record_endpoint, delete_record_endpoint, list_records_endpoint,
        update_record_endpoint,
    },
};

/// The largest accepted request body; uploaded photos routinely exceed
/// axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Return a router with all the app's API routes.
///
/// Serving the attachment blob directory and the static frontend is left to
/// the caller, which knows the paths involved.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            endpoints::RECORDS_API,
            get(list_records_endpoint).post(create_record_endpoint),
        )
        .route(
            endpoints::RECORD_API,
            put(update_record_endpoint).delete(delete_record_endpoint),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
