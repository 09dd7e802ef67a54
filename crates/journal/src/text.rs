use std::sync::Arc;

use async_trait::async_trait;
use odoscan_core::UploadConfig;
use thiserror::Error;

use crate::relay::{RelayError, ScriptRelay};

#[derive(Debug, Error)]
pub enum TextError {
    #[error("Unsupported file type: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// Plain text out of an uploaded PDF or Word document.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn extract_text(&self, file_name: &str, bytes: &[u8]) -> Result<String, TextError>;
}

/// Refuses every document; used when no extraction command is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtractor;

#[async_trait]
impl TextExtractor for NoExtractor {
    fn name(&self) -> &str {
        "none"
    }

    async fn extract_text(&self, file_name: &str, _bytes: &[u8]) -> Result<String, TextError> {
        Err(TextError::Unsupported(file_name.to_string()))
    }
}

/// Runs the configured command on the document. The temp file keeps the
/// upload's extension so the command can tell PDF from DOCX.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    relay: ScriptRelay,
}

impl CommandExtractor {
    pub fn new(command: &[String]) -> Result<Self, RelayError> {
        Ok(Self { relay: ScriptRelay::new(command)? })
    }
}

#[async_trait]
impl TextExtractor for CommandExtractor {
    fn name(&self) -> &str {
        "command"
    }

    async fn extract_text(&self, file_name: &str, bytes: &[u8]) -> Result<String, TextError> {
        let suffix = file_name.rfind('.').map(|i| &file_name[i..]).unwrap_or("");
        Ok(self.relay.invoke(bytes, suffix).await?)
    }
}

pub fn from_config(config: &UploadConfig) -> Result<Arc<dyn TextExtractor>, RelayError> {
    if config.document_command.is_empty() {
        return Ok(Arc::new(NoExtractor));
    }
    Ok(Arc::new(CommandExtractor::new(&config.document_command)?))
}
