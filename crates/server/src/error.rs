use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use odoscan_journal::{RelayError, TextError};
use odoscan_ocr::{ErrorKind, OcrError, PipelineError, PreprocessError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected before any upstream call.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    TooLarge(String),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("Image could not be prepared: {0}")]
    Image(#[from] PreprocessError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("Document text extraction failed: {0}")]
    Extraction(RelayError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::TooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::TooLarge(err.body_text())
        } else {
            ApiError::BadRequest(err.body_text())
        }
    }
}

impl From<TextError> for ApiError {
    fn from(err: TextError) -> Self {
        match err {
            TextError::Unsupported(_) => ApiError::BadRequest(err.to_string()),
            TextError::Relay(e) => ApiError::Extraction(e),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Preprocess(e) => ApiError::Image(e),
            PipelineError::Ocr(e) => ApiError::Ocr(e),
        }
    }
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) | ApiError::Image(_) => (StatusCode::BAD_REQUEST, "validation"),
            ApiError::TooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            ApiError::Ocr(e) => match e.kind() {
                ErrorKind::Validation => (StatusCode::BAD_REQUEST, "validation"),
                ErrorKind::UpstreamUnavailable => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
                ErrorKind::MalformedResponse => (StatusCode::BAD_GATEWAY, "malformed_upstream_response"),
                ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
            ApiError::Relay(_) => (StatusCode::INTERNAL_SERVER_ERROR, "summarizer_failed"),
            ApiError::Extraction(_) => (StatusCode::INTERNAL_SERVER_ERROR, "extraction_failed"),
        }
    }

    pub fn required(field: &str) -> Self {
        ApiError::BadRequest(format!("Missing {field}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        match status {
            s if s.is_server_error() && s != StatusCode::BAD_GATEWAY => {
                tracing::error!("Internal error: {:#}", self)
            }
            StatusCode::BAD_GATEWAY => tracing::warn!("Upstream error: {}", self),
            _ => tracing::debug!("Client error: {}", self),
        }

        let body = json!({ "error": code, "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odoscan_core::ProviderKind;

    #[test]
    fn kinds_map_to_status() {
        let cases = [
            (ApiError::required("imageBase64"), StatusCode::BAD_REQUEST, "validation"),
            (
                OcrError::InvalidInput("empty".into()).into(),
                StatusCode::BAD_REQUEST,
                "validation",
            ),
            (
                OcrError::Provider { provider: ProviderKind::Typhoon, status: Some(429), message: "quota".into() }
                    .into(),
                StatusCode::BAD_GATEWAY,
                "upstream_unavailable",
            ),
            (
                OcrError::Malformed { provider: ProviderKind::Gemini, reason: "x".into() }.into(),
                StatusCode::BAD_GATEWAY,
                "malformed_upstream_response",
            ),
            (
                OcrError::NotConfigured(ProviderKind::OpenAi, "missing API key".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
            ),
            (
                RelayError::NoCommand.into(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "summarizer_failed",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code), "{err}");
        }
    }

    #[test]
    fn text_errors_split_by_cause() {
        let err: ApiError = TextError::Unsupported("scan.tiff".into()).into();
        assert_eq!(err.status_and_code(), (StatusCode::BAD_REQUEST, "validation"));
        let err: ApiError = TextError::Relay(RelayError::NoCommand).into();
        assert_eq!(err.status_and_code(), (StatusCode::INTERNAL_SERVER_ERROR, "extraction_failed"));
    }

    #[test]
    fn pipeline_errors_unwrap() {
        let err: ApiError = PipelineError::Ocr(OcrError::Engine("down".into())).into();
        assert!(matches!(err, ApiError::Ocr(OcrError::Engine(_))));
    }
}
