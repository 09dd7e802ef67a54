use async_trait::async_trait;
use odoscan_core::{ProviderKind, ResolvedProvider};
use serde_json::{json, Value};
use tracing::info;

use super::{http_client, require_key, send};
use crate::chat::{ChatBackend, ChatMessage, Role};
use crate::prompts::ocr_prompt;
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::OcrRequest;

/// Google Gemini `generateContent`, used both for chat and for image prompts.
pub struct GeminiBackend {
    client: reqwest::Client,
    config: ResolvedProvider,
}

impl GeminiBackend {
    pub fn new(config: ResolvedProvider) -> Result<Self, OcrError> {
        Ok(Self { client: http_client(&config)?, config })
    }

    async fn generate(&self, body: Value) -> Result<String, OcrError> {
        let key = require_key(&self.config)?;
        let http = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.config.base_url, self.config.model
            ))
            .query(&[("key", key)])
            .json(&body);
        send(ProviderKind::Gemini, http).await?.into_text(ProviderKind::Gemini)
    }
}

fn parts(message: &ChatMessage) -> Vec<Value> {
    let mut parts = vec![json!({ "text": message.content })];
    if let Some(image) = &message.image {
        parts.push(json!({
            "inlineData": { "mimeType": image.mime_type(), "data": image.to_base64() }
        }));
    }
    parts
}

/// Gemini knows only `user` and `model` turns; system messages travel
/// separately as `systemInstruction`.
fn request_body(messages: &[ChatMessage]) -> Value {
    let mut system = Vec::new();
    let mut contents = Vec::new();
    for message in messages {
        match message.role {
            Role::System => system.extend(parts(message)),
            Role::User => contents.push(json!({ "role": "user", "parts": parts(message) })),
            Role::Assistant => contents.push(json!({ "role": "model", "parts": parts(message) })),
        }
    }

    let mut body = json!({ "contents": contents });
    if !system.is_empty() {
        body["systemInstruction"] = json!({ "parts": system });
    }
    body
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, OcrError> {
        if !messages.iter().any(|m| m.role != Role::System) {
            return Err(OcrError::InvalidInput("conversation has no messages".into()));
        }
        info!(model = %self.config.model, turns = messages.len(), "Gemini request");
        self.generate(request_body(messages)).await
    }
}

#[async_trait]
impl OcrBackend for GeminiBackend {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn recognize(&self, request: &OcrRequest) -> Result<String, OcrError> {
        info!(model = %self.config.model, task = %request.task, "Gemini vision request");
        let message = ChatMessage::user(ocr_prompt(request.task, &request.anchor_text))
            .with_image(request.image.clone());
        self.generate(request_body(std::slice::from_ref(&message))).await
    }
}
