use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use odoscan_ocr::prompts::PAYMENT_JOURNAL_PROMPT;
use odoscan_ocr::{prepare_for_upload, ChatBackend, ChatMessage, ImageInput};
use serde::{Deserialize, Serialize};

use super::documents::TextResponse;
use crate::error::ApiError;
use crate::state::AppState;

const GEMINI_DEFAULT_PROMPT: &str = "Explain how AI works.";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<TextResponse>, ApiError> {
    let Json(req) = payload?;
    if req.messages.is_empty() {
        return Err(ApiError::required("messages"));
    }
    let text = state.chat.complete(&req.messages).await?;
    Ok(Json(TextResponse { text }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalyzeRequest {
    pub prompt: Option<String>,
    pub base64_image: String,
}

pub async fn image_analyze(
    State(state): State<AppState>,
    payload: Result<Json<ImageAnalyzeRequest>, JsonRejection>,
) -> Result<Json<TextResponse>, ApiError> {
    let Json(req) = payload?;
    let image = prepare_for_upload(ImageInput::from_base64(&req.base64_image, None)?)?;
    let prompt = req
        .prompt
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| PAYMENT_JOURNAL_PROMPT.to_string());

    let text = state
        .image_analysis
        .complete(&[ChatMessage::user(prompt).with_image(image)])
        .await?;
    Ok(Json(TextResponse { text }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepSeekRequest {
    #[serde(default)]
    pub prompt: String,
    pub base64_image: Option<String>,
    pub file_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn deepseek(
    State(state): State<AppState>,
    payload: Result<Json<DeepSeekRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    if req.prompt.trim().is_empty() {
        return Err(ApiError::required("prompt"));
    }

    let mut message = ChatMessage::user(req.prompt);
    if let Some(encoded) = req.base64_image.filter(|b| !b.trim().is_empty()) {
        message = message.with_image(ImageInput::from_base64(&encoded, req.file_type.as_deref())?);
    }
    let reply = state.deepseek.complete(&[message]).await?;
    Ok(Json(MessageResponse { message: reply }))
}

#[derive(Debug, Default, Deserialize)]
pub struct GeminiRequest {
    pub prompt: Option<String>,
}

pub async fn gemini(
    State(state): State<AppState>,
    payload: Result<Json<GeminiRequest>, JsonRejection>,
) -> Result<Json<TextResponse>, ApiError> {
    let Json(req) = payload?;
    let prompt = req
        .prompt
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| GEMINI_DEFAULT_PROMPT.to_string());
    let text = state.gemini.complete(&[ChatMessage::user(prompt)]).await?;
    Ok(Json(TextResponse { text }))
}
