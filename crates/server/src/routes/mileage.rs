use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use odoscan_core::{reconcile, OdometerReading, TripClaim, TripReconciliation};
use odoscan_ocr::{ImageInput, MileageReport, OdometerExtractor};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MileageOcrRequest {
    pub image_base64: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MileageOcrResponse {
    pub mileage: Option<String>,
    pub ocr_text: String,
}

pub async fn mileage_ocr(
    State(state): State<AppState>,
    payload: Result<Json<MileageOcrRequest>, JsonRejection>,
) -> Result<Json<MileageOcrResponse>, ApiError> {
    let Json(req) = payload?;
    if req.image_base64.trim().is_empty() {
        return Err(ApiError::required("imageBase64"));
    }
    let image = ImageInput::from_base64(&req.image_base64, req.mime_type.as_deref())?;

    let reading = state.mileage_pipeline().process_single(image).await?;
    info!(found = reading.is_found(), "single odometer read");
    Ok(Json(MileageOcrResponse { mileage: reading.matched_value, ocr_text: reading.raw_text }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MileageRequest {
    pub start_image_base64: String,
    pub end_image_base64: String,
    pub mime_type: Option<String>,
    #[serde(default)]
    pub claim: Option<TripClaim>,
}

#[derive(Debug, Serialize)]
pub struct MileageResponse {
    #[serde(flatten)]
    pub report: MileageReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim: Option<TripClaim>,
    pub advisory: Option<String>,
}

pub async fn mileage(
    State(state): State<AppState>,
    payload: Result<Json<MileageRequest>, JsonRejection>,
) -> Result<Json<MileageResponse>, ApiError> {
    let Json(req) = payload?;
    // Both uploads are decoded before anything is sent upstream.
    let mime = req.mime_type.as_deref();
    let first = ImageInput::from_base64(&req.start_image_base64, mime)?;
    let second = ImageInput::from_base64(&req.end_image_base64, mime)?;

    let report = state.mileage_pipeline().process_pair(first, second).await;
    let advisory = report.reconciliation.as_ref().and_then(|r| advise(&state, r));
    Ok(Json(MileageResponse { report, claim: req.claim, advisory }))
}

#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    #[serde(flatten)]
    pub reconciliation: TripReconciliation,
    pub advisory: Option<String>,
}

pub async fn reconcile_trip(
    State(state): State<AppState>,
    payload: Result<Json<ReconcileRequest>, JsonRejection>,
) -> Result<Json<ReconcileResponse>, ApiError> {
    let Json(req) = payload?;
    let reconciliation = reconcile(req.start, req.end, &state.config.mileage);
    let advisory = advise(&state, &reconciliation);
    Ok(Json(ReconcileResponse { reconciliation, advisory }))
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

pub async fn extract(
    payload: Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<Json<OdometerReading>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(OdometerExtractor::read(&req.text)))
}

/// Render the approval advisory, if any, and log it.
fn advise(state: &AppState, reconciliation: &TripReconciliation) -> Option<String> {
    let message = reconciliation.advisory(&state.config.mileage, &state.config.advisory)?;
    warn!(cost = %reconciliation.cost, distance = reconciliation.distance, "{message}");
    Some(message)
}
