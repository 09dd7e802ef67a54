use std::sync::Mutex;

use async_trait::async_trait;
use odoscan_core::ProviderKind;
use serde::{Deserialize, Serialize};

use crate::recognizer::OcrError;
use crate::types::ImageInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(skip)]
    pub image: Option<ImageInput>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), image: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), image: None }
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = Some(image);
        self
    }
}

/// A conversational model: messages in, one reply out.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn provider(&self) -> ProviderKind;

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, OcrError>;
}

// ── Mock backend ─────────────────────────────────────────────────────────────

/// Answers every conversation with the same reply and keeps what it was sent.
pub struct MockChat {
    reply: Result<String, String>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockChat {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: Ok(reply.into()), seen: Mutex::new(Vec::new()) }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self { reply: Err(message.into()), seen: Mutex::new(Vec::new()) }
    }

    pub fn conversations(&self) -> Vec<Vec<ChatMessage>> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatBackend for MockChat {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Mock
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, OcrError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(messages.to_vec());
        }
        self.reply.clone().map_err(|message| OcrError::Provider {
            provider: ProviderKind::Mock,
            status: None,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_json_omits_image() {
        let img = ImageInput::new(b"x".to_vec(), "image/png").unwrap();
        let msg = ChatMessage::user("hi").with_image(img);
        assert_eq!(serde_json::to_string(&msg).unwrap(), r#"{"role":"user","content":"hi"}"#);
    }

    #[test]
    fn message_from_client_json() {
        let msgs: Vec<ChatMessage> = serde_json::from_str(
            r#"[{"role":"user","content":"hello"},{"role":"assistant","content":"hi"}]"#,
        )
        .unwrap();
        assert_eq!(msgs[1], ChatMessage::assistant("hi"));
    }

    #[tokio::test]
    async fn mock_chat_records_conversation() {
        let chat = MockChat::new("reply");
        let out = chat.complete(&[ChatMessage::user("q")]).await.unwrap();
        assert_eq!(out, "reply");
        assert_eq!(chat.conversations().len(), 1);

        let failing = MockChat::failing("down");
        assert!(failing.complete(&[]).await.is_err());
    }
}
