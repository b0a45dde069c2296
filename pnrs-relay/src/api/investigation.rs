//! Investigation endpoints
//!
//! POST copies records for a list of phone numbers into the investigation;
//! GET returns every record tagged with it.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::query::{get_by_investigation, InvestigationRecord};
use crate::transfer::transfer;
use crate::AppState;

/// Body of a transfer request
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    #[serde(default)]
    pub phone_numbers: Vec<String>,
}

/// Acknowledgement of a completed transfer
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub message: String,
    pub matched: usize,
    pub moved: usize,
    pub skipped: usize,
}

/// POST /investigation/:invest_id/numbers
///
/// Succeeds whenever the store does, even if nothing new was moved.
pub async fn transfer_numbers(
    State(state): State<AppState>,
    Path(invest_id): Path<String>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, ApiError> {
    let report = transfer(
        &state.source,
        &state.destination,
        &request.phone_numbers,
        &invest_id,
    )
    .await?;

    Ok(Json(TransferResponse {
        message: "Data moved successfully.".to_string(),
        matched: report.matched,
        moved: report.moved,
        skipped: report.skipped,
    }))
}

/// GET /investigation/:invest_id/numbers
///
/// 404 when the investigation has no records.
pub async fn get_investigation_numbers(
    State(state): State<AppState>,
    Path(invest_id): Path<String>,
) -> Result<Json<Vec<InvestigationRecord>>, ApiError> {
    let records = get_by_investigation(&state.destination, &invest_id).await?;
    Ok(Json(records))
}
