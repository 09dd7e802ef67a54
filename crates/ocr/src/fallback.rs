use async_trait::async_trait;
use odoscan_core::{ProviderKind, TaskType};
use tracing::warn;

use crate::recognizer::{ErrorKind, OcrBackend, OcrError};
use crate::types::OcrRequest;

/// Text plus the provider that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognized {
    pub text: String,
    pub provider: ProviderKind,
}

/// Primary backend with a single manual fallback.
///
/// The secondary is asked once, with its own task and anchor text, whenever
/// the primary fails: vendor error, unreachable host, unusable body or a
/// missing key. Input the primary rejected as invalid is returned unchanged,
/// since the secondary would reject it too. No retries.
pub struct FallbackRecognizer<P: OcrBackend, S: OcrBackend> {
    primary: P,
    secondary: S,
    secondary_task: TaskType,
    secondary_anchor: String,
}

impl<P: OcrBackend, S: OcrBackend> FallbackRecognizer<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary, secondary_task: TaskType::Summary, secondary_anchor: String::new() }
    }

    pub fn with_secondary_task(mut self, task: TaskType, anchor_text: impl Into<String>) -> Self {
        self.secondary_task = task;
        self.secondary_anchor = anchor_text.into();
        self
    }

    pub async fn recognize_with_source(&self, request: &OcrRequest) -> Result<Recognized, OcrError> {
        match self.primary.recognize(request).await {
            Ok(text) => Ok(Recognized { text, provider: self.primary.provider() }),
            Err(e) if e.kind() == ErrorKind::Validation => Err(e),
            Err(e) => {
                warn!(
                    primary = %self.primary.provider(),
                    secondary = %self.secondary.provider(),
                    "primary OCR failed, falling back: {e}"
                );
                let retry = request
                    .clone()
                    .with_task(self.secondary_task)
                    .with_anchor_text(self.secondary_anchor.clone());
                let text = self.secondary.recognize(&retry).await?;
                Ok(Recognized { text, provider: self.secondary.provider() })
            }
        }
    }
}

#[async_trait]
impl<P: OcrBackend, S: OcrBackend> OcrBackend for FallbackRecognizer<P, S> {
    fn provider(&self) -> ProviderKind {
        self.primary.provider()
    }

    async fn recognize(&self, request: &OcrRequest) -> Result<String, OcrError> {
        self.recognize_with_source(request).await.map(|r| r.text)
    }
}
