use async_trait::async_trait;
use odoscan_core::{ProviderKind, ResolvedProvider};
use serde_json::{json, Value};
use tracing::info;

use super::{http_client, require_key, send};
use crate::chat::{ChatBackend, ChatMessage};
use crate::prompts::ocr_prompt;
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::OcrRequest;

/// Any OpenAI-compatible `/chat/completions` endpoint: OpenAI itself, the
/// HuggingFace router, DeepSeek-R1 behind the router, or Typhoon's chat models.
pub struct ChatCompletions {
    client: reqwest::Client,
    config: ResolvedProvider,
}

impl ChatCompletions {
    pub fn new(config: ResolvedProvider) -> Result<Self, OcrError> {
        Ok(Self { client: http_client(&config)?, config })
    }

    async fn post(&self, messages: Vec<Value>, extra: Option<Value>) -> Result<String, OcrError> {
        let key = require_key(&self.config)?;
        let mut body = json!({ "model": self.config.model, "messages": messages });
        if let (Some(Value::Object(extra)), Value::Object(map)) = (extra, &mut body) {
            map.extend(extra);
        }

        let http = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(key)
            .json(&body);
        send(self.config.kind, http).await?.into_text(self.config.kind)
    }
}

/// Wire form of one message. Messages carrying an image switch to the
/// content-array form with an inline data URL.
fn wire_message(message: &ChatMessage) -> Value {
    match &message.image {
        Some(image) => json!({
            "role": message.role,
            "content": [
                { "type": "text", "text": message.content },
                { "type": "image_url", "image_url": { "url": image.data_url() } }
            ]
        }),
        None => json!({ "role": message.role, "content": message.content }),
    }
}

#[async_trait]
impl ChatBackend for ChatCompletions {
    fn provider(&self) -> ProviderKind {
        self.config.kind
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, OcrError> {
        if messages.is_empty() {
            return Err(OcrError::InvalidInput("conversation has no messages".into()));
        }
        info!(provider = %self.config.kind, model = %self.config.model, turns = messages.len(), "chat request");
        self.post(messages.iter().map(wire_message).collect(), None).await
    }
}

#[async_trait]
impl OcrBackend for ChatCompletions {
    fn provider(&self) -> ProviderKind {
        self.config.kind
    }

    async fn recognize(&self, request: &OcrRequest) -> Result<String, OcrError> {
        info!(provider = %self.config.kind, model = %self.config.model, task = %request.task, "vision OCR request");
        let message = ChatMessage::user(ocr_prompt(request.task, &request.anchor_text))
            .with_image(request.image.clone());
        self.post(vec![wire_message(&message)], Some(json!({ "temperature": 0 }))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageInput;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reply(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }))
    }

    fn backend(kind: ProviderKind, uri: &str) -> ChatCompletions {
        ChatCompletions::new(ResolvedProvider::with_base_url(kind, uri).with_api_key("sk-test")).unwrap()
    }

    #[tokio::test]
    async fn chat_sends_history_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "messages": [
                    { "role": "user", "content": "hello" },
                    { "role": "assistant", "content": "hi" },
                    { "role": "user", "content": "total?" }
                ]
            })))
            .respond_with(reply("  4,800.00  "))
            .expect(1)
            .mount(&server)
            .await;

        let chat = backend(ProviderKind::OpenAi, &server.uri());
        let out = chat
            .complete(&[
                ChatMessage::user("hello"),
                ChatMessage::assistant("hi"),
                ChatMessage::user("total?"),
            ])
            .await
            .unwrap();
        assert_eq!(out, "4,800.00");
    }

    #[tokio::test]
    async fn image_message_uses_content_array() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(reply("{\"document_number\": \"PV-001\"}"))
            .mount(&server)
            .await;

        let chat = backend(ProviderKind::HuggingFace, &server.uri());
        let image = ImageInput::new(b"img".to_vec(), "image/png").unwrap();
        let out = chat
            .complete(&[ChatMessage::user("analyse").with_image(image)])
            .await
            .unwrap();
        assert!(out.contains("PV-001"));

        let received = server.received_requests().await.unwrap();
        let sent: Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(sent["model"], "meta-llama/llama-4-scout-17b-16e-instruct");
        assert_eq!(sent["messages"][0]["content"][0]["text"], "analyse");
        assert_eq!(sent["messages"][0]["content"][1]["image_url"]["url"], "data:image/png;base64,aW1n");
    }

    #[tokio::test]
    async fn recognize_reports_its_provider_and_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "temperature": 0 })))
            .respond_with(reply("ODO 045231"))
            .mount(&server)
            .await;

        let backend = backend(ProviderKind::DeepSeek, &server.uri());
        assert_eq!(OcrBackend::provider(&backend), ProviderKind::DeepSeek);
        let request = OcrRequest::new(ImageInput::new(b"img".to_vec(), "image/jpeg").unwrap());
        assert_eq!(backend.recognize(&request).await.unwrap(), "ODO 045231");
    }

    #[tokio::test]
    async fn empty_conversation_is_rejected_locally() {
        let chat = backend(ProviderKind::OpenAi, "http://127.0.0.1:9");
        let err = chat.complete(&[]).await.unwrap_err();
        assert!(matches!(err, OcrError::InvalidInput(_)));
    }
}
