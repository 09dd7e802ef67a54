use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use odoscan_core::TaskType;
use odoscan_journal::{digest, JournalSummary, Summarizer};
use odoscan_ocr::{prepare_for_upload, ImageInput, OcrBackend, OcrRequest};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TyphoonOcrRequest {
    pub image_base64: String,
    #[serde(default)]
    pub anchor_text: String,
    pub task_type: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub text: String,
}

pub async fn typhoon_ocr(
    State(state): State<AppState>,
    payload: Result<Json<TyphoonOcrRequest>, JsonRejection>,
) -> Result<Json<TextResponse>, ApiError> {
    let Json(req) = payload?;
    let task = TaskType::from_str(&req.task_type)
        .map_err(|_| ApiError::BadRequest(format!("Invalid taskType '{}'", req.task_type)))?;
    let image = ImageInput::from_base64(&req.image_base64, req.mime_type.as_deref())?;

    let request = OcrRequest::new(prepare_for_upload(image)?)
        .with_task(task)
        .with_anchor_text(req.anchor_text);
    let text = state.typhoon.recognize(&request).await?;
    Ok(Json(TextResponse { text }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummaryRequest {
    pub base64_image: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummaryResponse {
    pub ocr_text: String,
    pub digest: String,
    pub summary: Option<JournalSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_error: Option<String>,
}

/// OCR a journal page, then produce both the quick digest and the full
/// summary. A summarizer failure still returns the OCR text and digest.
pub async fn document_summary(
    State(state): State<AppState>,
    payload: Result<Json<DocumentSummaryRequest>, JsonRejection>,
) -> Result<Json<DocumentSummaryResponse>, ApiError> {
    let Json(req) = payload?;
    let image = ImageInput::from_base64(&req.base64_image, req.mime_type.as_deref())?;

    let text = state.document.recognize(&OcrRequest::new(prepare_for_upload(image)?)).await?;
    info!(chars = text.chars().count(), "document recognized");

    let (summary, summary_error) = match state.summarizer.summarize(&text).await {
        Ok(summary) => (Some(summary), None),
        Err(e) => {
            warn!(summarizer = state.summarizer.name(), "summary failed: {e}");
            (None, Some(e.to_string()))
        }
    };

    Ok(Json(DocumentSummaryResponse { digest: digest(&text), ocr_text: text, summary, summary_error }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartSummaryRequest {
    #[serde(default)]
    pub ocr_text: String,
}

pub async fn smart_summary(
    State(state): State<AppState>,
    payload: Result<Json<SmartSummaryRequest>, JsonRejection>,
) -> Result<Json<JournalSummary>, ApiError> {
    let Json(req) = payload?;
    if req.ocr_text.trim().is_empty() {
        return Err(ApiError::required("ocrText"));
    }
    Ok(Json(state.summarizer.summarize(&req.ocr_text).await?))
}
