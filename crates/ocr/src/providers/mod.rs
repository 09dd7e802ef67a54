//! Vendor backends and the factory that builds them from configuration.

pub mod gemini;
pub mod google_vision;
pub mod ocr_space;
pub mod openai_compat;
pub mod typhoon;

use std::sync::Arc;

use odoscan_core::{ProviderKind, ResolvedProvider};
use tracing::debug;

use crate::chat::ChatBackend;
use crate::envelope::{self, ResponseEnvelope};
use crate::recognizer::{MockRecognizer, OcrBackend, OcrError};

pub use gemini::GeminiBackend;
pub use google_vision::GoogleVision;
pub use ocr_space::OcrSpace;
pub use openai_compat::ChatCompletions;
pub use typhoon::TyphoonOcr;

/// Build the OCR backend for a resolved provider.
pub fn build_ocr_backend(config: &ResolvedProvider) -> Result<Arc<dyn OcrBackend>, OcrError> {
    let backend: Arc<dyn OcrBackend> = match config.kind {
        ProviderKind::Typhoon => Arc::new(TyphoonOcr::new(config.clone())?),
        ProviderKind::OpenAi | ProviderKind::HuggingFace | ProviderKind::DeepSeek => {
            Arc::new(ChatCompletions::new(config.clone())?)
        }
        ProviderKind::GoogleVision => Arc::new(GoogleVision::new(config.clone())?),
        ProviderKind::Gemini => Arc::new(GeminiBackend::new(config.clone())?),
        ProviderKind::OcrSpace => Arc::new(OcrSpace::new(config.clone())?),
        ProviderKind::Tesseract => build_tesseract(config)?,
        ProviderKind::Mock => Arc::new(MockRecognizer::new("")),
    };
    Ok(backend)
}

/// Build the chat backend for a resolved provider.
pub fn build_chat_backend(config: &ResolvedProvider) -> Result<Arc<dyn ChatBackend>, OcrError> {
    match config.kind {
        ProviderKind::Typhoon
        | ProviderKind::OpenAi
        | ProviderKind::HuggingFace
        | ProviderKind::DeepSeek => Ok(Arc::new(ChatCompletions::new(config.clone())?)),
        ProviderKind::Gemini => Ok(Arc::new(GeminiBackend::new(config.clone())?)),
        ProviderKind::Mock => Ok(Arc::new(crate::chat::MockChat::new(""))),
        other => Err(OcrError::NotConfigured(other, "provider has no chat interface".into())),
    }
}

#[cfg(feature = "tesseract")]
fn build_tesseract(config: &ResolvedProvider) -> Result<Arc<dyn OcrBackend>, OcrError> {
    use crate::recognizer::tesseract_backend::TesseractRecognizer;
    let data_path = Some(config.base_url.clone()).filter(|p| !p.is_empty());
    Ok(Arc::new(TesseractRecognizer::new(data_path, &config.language)))
}

#[cfg(not(feature = "tesseract"))]
fn build_tesseract(_config: &ResolvedProvider) -> Result<Arc<dyn OcrBackend>, OcrError> {
    Err(OcrError::NotAvailable)
}

// ── Shared HTTP plumbing ─────────────────────────────────────────────────────

pub(crate) fn http_client(config: &ResolvedProvider) -> Result<reqwest::Client, OcrError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.request_timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| OcrError::NotConfigured(config.kind, format!("HTTP client: {e}")))
}

pub(crate) fn require_key(config: &ResolvedProvider) -> Result<&str, OcrError> {
    config.api_key.as_deref().ok_or_else(|| {
        let var = config.kind.default_key_env().unwrap_or("the configured key variable");
        OcrError::NotConfigured(config.kind, format!("missing API key (set {var})"))
    })
}

/// Send a prepared request and decode the body into an envelope.
pub(crate) async fn send(
    provider: ProviderKind,
    request: reqwest::RequestBuilder,
) -> Result<ResponseEnvelope, OcrError> {
    let response = request
        .send()
        .await
        .map_err(|source| OcrError::Transport { provider, source })?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| OcrError::Transport { provider, source })?;

    if !status.is_success() {
        let message = match ResponseEnvelope::decode(provider, &body) {
            Ok(ResponseEnvelope::Failure { error }) => envelope::error_message(&error),
            _ => truncate(&body, 300),
        };
        return Err(OcrError::Provider { provider, status: Some(status.as_u16()), message });
    }

    let envelope = ResponseEnvelope::decode(provider, &body)?;
    debug!(%provider, shape = envelope.shape(), "decoded response");
    Ok(envelope)
}

fn truncate(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let mut out: String = body.chars().take(max_chars).collect();
    out.push('…');
    out
}
