use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use odoscan_core::{ProviderKind, TaskType};
use thiserror::Error;

use crate::types::OcrRequest;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: ProviderKind,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned an error: {message}")]
    Provider {
        provider: ProviderKind,
        status: Option<u16>,
        message: String,
    },
    #[error("{provider} response was malformed: {reason}")]
    Malformed { provider: ProviderKind, reason: String },
    #[error("{0} is not configured: {1}")]
    NotConfigured(ProviderKind, String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available; build with the `tesseract` feature")]
    NotAvailable,
}

/// Where a failure sits in the error taxonomy callers react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any external call.
    Validation,
    /// The provider could not be reached or reported a failure.
    UpstreamUnavailable,
    /// The provider answered but the body carried nothing usable.
    MalformedResponse,
    /// Local misconfiguration.
    Internal,
}

impl OcrError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OcrError::InvalidInput(_) => ErrorKind::Validation,
            OcrError::Transport { .. } | OcrError::Provider { .. } | OcrError::Engine(_) => {
                ErrorKind::UpstreamUnavailable
            }
            OcrError::Malformed { .. } => ErrorKind::MalformedResponse,
            OcrError::NotConfigured(..) | OcrError::NotAvailable => ErrorKind::Internal,
        }
    }
}

/// Abstraction over an OCR backend.
/// Implementations take one image and return the recognized text, with any
/// vendor envelope already removed.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    fn provider(&self) -> ProviderKind;

    async fn recognize(&self, request: &OcrRequest) -> Result<String, OcrError>;
}

#[async_trait]
impl<T: OcrBackend + ?Sized> OcrBackend for Arc<T> {
    fn provider(&self) -> ProviderKind {
        (**self).provider()
    }

    async fn recognize(&self, request: &OcrRequest) -> Result<String, OcrError> {
        (**self).recognize(request).await
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

#[derive(Debug, Clone)]
pub enum MockOutcome {
    Text(String),
    /// Behaves like a vendor response carrying an `error` field.
    ProviderError(String),
    /// Behaves like the vendor being unreachable.
    Unavailable(String),
    /// Behaves like a vendor body that decodes to nothing usable.
    Malformed(String),
    /// Behaves like a vendor whose API key is unset.
    NotConfigured,
    /// Behaves like a request rejected before any call.
    Invalid(String),
}

/// Replays scripted outcomes in order, repeating the last one once the
/// script runs out. Records the task of every call.
pub struct MockRecognizer {
    outcomes: Mutex<VecDeque<MockOutcome>>,
    tasks: Mutex<Vec<TaskType>>,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self::scripted(vec![MockOutcome::Text(text.into())])
    }

    pub fn scripted(outcomes: Vec<MockOutcome>) -> Self {
        Self { outcomes: Mutex::new(outcomes.into()), tasks: Mutex::new(Vec::new()) }
    }

    pub fn provider_error(message: impl Into<String>) -> Self {
        Self::scripted(vec![MockOutcome::ProviderError(message.into())])
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::scripted(vec![MockOutcome::Unavailable(message.into())])
    }

    pub fn calls(&self) -> usize {
        self.tasks.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn tasks(&self) -> Vec<TaskType> {
        self.tasks.lock().map(|t| t.clone()).unwrap_or_default()
    }

    fn next_outcome(&self) -> MockOutcome {
        let mut outcomes = match self.outcomes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if outcomes.len() > 1 {
            outcomes.pop_front().unwrap_or(MockOutcome::Text(String::new()))
        } else {
            outcomes.front().cloned().unwrap_or(MockOutcome::Text(String::new()))
        }
    }
}

#[async_trait]
impl OcrBackend for MockRecognizer {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Mock
    }

    async fn recognize(&self, request: &OcrRequest) -> Result<String, OcrError> {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push(request.task);
        }
        match self.next_outcome() {
            MockOutcome::Text(text) => Ok(text),
            MockOutcome::ProviderError(message) => Err(OcrError::Provider {
                provider: ProviderKind::Mock,
                status: None,
                message,
            }),
            MockOutcome::Unavailable(message) => Err(OcrError::Engine(message)),
            MockOutcome::Malformed(reason) => Err(OcrError::Malformed { provider: ProviderKind::Mock, reason }),
            MockOutcome::NotConfigured => {
                Err(OcrError::NotConfigured(ProviderKind::Mock, "API key is not set".into()))
            }
            MockOutcome::Invalid(message) => Err(OcrError::InvalidInput(message)),
        }
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError};
    use crate::types::OcrRequest;
    use async_trait::async_trait;
    use leptess::LepTess;
    use odoscan_core::ProviderKind;

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }
    }

    #[async_trait]
    impl OcrBackend for TesseractRecognizer {
        fn provider(&self) -> ProviderKind {
            ProviderKind::Tesseract
        }

        async fn recognize(&self, request: &OcrRequest) -> Result<String, OcrError> {
            let bytes = request.image.bytes().to_vec();
            let data_path = self.data_path.clone();
            let lang = self.lang.clone();

            tokio::task::spawn_blocking(move || {
                let mut lt = LepTess::new(data_path.as_deref(), &lang)
                    .map_err(|e| OcrError::Engine(e.to_string()))?;
                lt.set_image_from_mem(&bytes)
                    .map_err(|e| OcrError::InvalidInput(e.to_string()))?;
                lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
            })
            .await
            .map_err(|e| OcrError::Engine(e.to_string()))?
        }
    }
}
