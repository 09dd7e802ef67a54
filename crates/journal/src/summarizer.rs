use std::sync::Arc;

use async_trait::async_trait;
use odoscan_core::SummarizerConfig;

use crate::relay::{RelayError, ScriptRelay};
use crate::summary::JournalSummary;

/// Turns journal OCR text into a [`JournalSummary`].
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    async fn summarize(&self, text: &str) -> Result<JournalSummary, RelayError>;
}

/// In-process summarizer built on the journal regexes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeSummarizer;

#[async_trait]
impl Summarizer for NativeSummarizer {
    fn name(&self) -> &str {
        "native"
    }

    async fn summarize(&self, text: &str) -> Result<JournalSummary, RelayError> {
        Ok(JournalSummary::from_text(text))
    }
}

#[async_trait]
impl Summarizer for ScriptRelay {
    fn name(&self) -> &str {
        "script"
    }

    async fn summarize(&self, text: &str) -> Result<JournalSummary, RelayError> {
        self.run(text).await
    }
}

/// The external command when one is configured, the native summarizer otherwise.
pub fn from_config(config: &SummarizerConfig) -> Result<Arc<dyn Summarizer>, RelayError> {
    if config.command.is_empty() {
        return Ok(Arc::new(NativeSummarizer));
    }
    Ok(Arc::new(ScriptRelay::new(&config.command)?))
}
