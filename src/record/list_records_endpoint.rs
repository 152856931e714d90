//! Defines the endpoint for querying records.

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use serde::Deserialize;

use crate::{
    AppState, Error,
    record::{Record, filter::RecordFilter, form::parse_date, service::RecordService},
};

/// The state needed to query records.
#[derive(Clone)]
pub struct ListRecordsState {
    /// The service coordinating the ledger database and attachment store.
    pub record_service: RecordService,
}

impl FromRef<AppState> for ListRecordsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            record_service: state.record_service.clone(),
        }
    }
}

/// The query parameters accepted by the records listing endpoint.
///
/// All parameters are optional. The frontend submits cleared search fields
/// as empty strings, so those are treated as absent.
#[derive(Debug, Default, Deserialize)]
pub struct RecordsQuery {
    /// Include records dated on or after this day, `YYYY-MM-DD`.
    #[serde(default, rename = "startDate")]
    pub start_date: Option<String>,
    /// Include records dated on or before this day, `YYYY-MM-DD`.
    #[serde(default, rename = "endDate")]
    pub end_date: Option<String>,
    /// Include records with exactly this category.
    #[serde(default)]
    pub category: Option<String>,
}

impl RecordsQuery {
    fn into_filter(self) -> Result<RecordFilter, Error> {
        Ok(RecordFilter {
            start_date: parse_optional_date(self.start_date)?,
            end_date: parse_optional_date(self.end_date)?,
            category: self.category.filter(|category| !category.is_empty()),
        })
    }
}

fn parse_optional_date(text: Option<String>) -> Result<Option<time::Date>, Error> {
    match text {
        Some(text) if !text.is_empty() => parse_date(&text).map(Some),
        _ => Ok(None),
    }
}

/// A route handler returning all records matching the query parameters,
/// newest first.
pub async fn list_records_endpoint(
    State(state): State<ListRecordsState>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<Vec<Record>>, Error> {
    let filter = query.into_filter()?;

    let records = state.record_service.query(&filter)?;

    Ok(Json(records))
}
