use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use odoscan_core::TaskType;

use crate::recognizer::OcrError;

/// An uploaded image, held as raw bytes plus its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    bytes: Vec<u8>,
    mime_type: String,
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Result<Self, OcrError> {
        if bytes.is_empty() {
            return Err(OcrError::InvalidInput("image is empty".into()));
        }
        Ok(Self { bytes, mime_type: mime_type.into() })
    }

    /// Decode a base64 upload. Accepts a bare payload or a full
    /// `data:<mime>;base64,<payload>` URL. Without a MIME hint the type is
    /// sniffed from the bytes, defaulting to JPEG.
    pub fn from_base64(encoded: &str, mime_hint: Option<&str>) -> Result<Self, OcrError> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(OcrError::InvalidInput("image payload is empty".into()));
        }

        let (url_mime, payload) = match encoded.strip_prefix("data:") {
            Some(rest) => {
                let (meta, payload) = rest
                    .split_once(',')
                    .ok_or_else(|| OcrError::InvalidInput("malformed data URL".into()))?;
                let mime = meta.strip_suffix(";base64").unwrap_or(meta);
                (Some(mime.to_string()).filter(|m| !m.is_empty()), payload)
            }
            None => (None, encoded),
        };

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| OcrError::InvalidInput(format!("invalid base64: {e}")))?;

        let mime = url_mime
            .or_else(|| mime_hint.map(str::to_string).filter(|m| !m.is_empty()))
            .unwrap_or_else(|| sniff_mime(&bytes).to_string());
        Self::new(bytes, mime)
    }

    pub async fn read(path: &Path) -> Result<Self, std::io::Error> {
        let bytes = tokio::fs::read(path).await?;
        let mime = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| image::ImageFormat::from_extension(e).map(|f| f.to_mime_type()))
            .unwrap_or_else(|| sniff_mime(&bytes));
        Self::new(bytes, mime)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// A file name for multipart uploads, with an extension matching the MIME type.
    pub fn file_name(&self) -> String {
        let ext = image::ImageFormat::from_mime_type(&self.mime_type)
            .and_then(|f| f.extensions_str().first().copied())
            .unwrap_or("bin");
        format!("upload.{ext}")
    }
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or("image/jpeg")
}

/// One recognition call: the image plus what to ask the backend for.
#[derive(Debug, Clone)]
pub struct OcrRequest {
    pub image: ImageInput,
    pub task: TaskType,
    /// Text already known about the page, passed to prompt-driven backends.
    pub anchor_text: String,
}

impl OcrRequest {
    pub fn new(image: ImageInput) -> Self {
        Self { image, task: TaskType::Default, anchor_text: String::new() }
    }

    pub fn with_task(mut self, task: TaskType) -> Self {
        self.task = task;
        self
    }

    pub fn with_anchor_text(mut self, anchor_text: impl Into<String>) -> Self {
        self.anchor_text = anchor_text.into();
        self
    }
}
