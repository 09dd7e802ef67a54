use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use odoscan_journal::TextExtractor;
use odoscan_ocr::prompts::document_summary_prompt;
use odoscan_ocr::{prepare_for_upload, ChatBackend, ChatMessage, ImageInput, OcrBackend, OcrRequest};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Reply used instead of calling the model when nothing was extracted.
pub const NO_TEXT_IN_FILE: &str = "No text found in the file";

/// How an upload is turned into text, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadKind {
    Image(&'static str),
    PlainText,
    Document,
}

impl UploadKind {
    fn from_file_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(UploadKind::Image("image/jpeg")),
            "png" => Some(UploadKind::Image("image/png")),
            "txt" => Some(UploadKind::PlainText),
            "pdf" | "docx" => Some(UploadKind::Document),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub text: String,
    pub gpt: String,
}

/// Multipart `file` upload: extract its text, then ask the chat model to
/// summarise it.
pub async fn upload(
    State(state): State<AppState>,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = payload?;

    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        file = Some((name, bytes));
        break;
    }
    let (name, bytes) = file.ok_or_else(|| ApiError::BadRequest("No file uploaded".into()))?;

    let kind = UploadKind::from_file_name(&name)
        .ok_or_else(|| ApiError::BadRequest(format!("Unsupported file type: {name}")))?;

    let text = match kind {
        UploadKind::Image(mime) => {
            let image = prepare_for_upload(ImageInput::new(bytes.to_vec(), mime)?)?;
            state.document.recognize(&OcrRequest::new(image)).await?
        }
        UploadKind::PlainText => String::from_utf8_lossy(&bytes).into_owned(),
        UploadKind::Document => state.extractor.extract_text(&name, &bytes).await?,
    };
    info!(file = %name, chars = text.chars().count(), "upload extracted");

    if text.trim().is_empty() {
        return Ok(Json(UploadResponse { text: String::new(), gpt: NO_TEXT_IN_FILE.to_string() }));
    }

    let gpt = state.chat.complete(&[ChatMessage::user(document_summary_prompt(&text))]).await?;
    Ok(Json(UploadResponse { text, gpt }))
}
