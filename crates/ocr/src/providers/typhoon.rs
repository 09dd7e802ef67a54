use async_trait::async_trait;
use odoscan_core::{ProviderKind, ResolvedProvider};
use serde_json::json;
use tracing::info;

use super::{http_client, require_key, send};
use crate::prompts::ocr_prompt;
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::OcrRequest;

/// Typhoon OCR: an OpenAI-compatible vision endpoint driven by task prompts.
pub struct TyphoonOcr {
    client: reqwest::Client,
    config: ResolvedProvider,
}

impl TyphoonOcr {
    pub fn new(config: ResolvedProvider) -> Result<Self, OcrError> {
        Ok(Self { client: http_client(&config)?, config })
    }
}

#[async_trait]
impl OcrBackend for TyphoonOcr {
    fn provider(&self) -> ProviderKind {
        self.config.kind
    }

    async fn recognize(&self, request: &OcrRequest) -> Result<String, OcrError> {
        let key = require_key(&self.config)?;
        info!(model = %self.config.model, task = %request.task, "Typhoon OCR request");

        let body = json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": ocr_prompt(request.task, &request.anchor_text) },
                    { "type": "image_url", "image_url": { "url": request.image.data_url() } }
                ]
            }],
            "max_tokens": 4096,
            "temperature": 0,
            "top_p": 1,
            "repetition_penalty": 1.0
        });

        let http = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(key)
            .json(&body);

        send(self.config.kind, http).await?.into_text(self.config.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageInput;
    use odoscan_core::TaskType;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> OcrRequest {
        OcrRequest::new(ImageInput::new(b"jpegbytes".to_vec(), "image/jpeg").unwrap())
            .with_task(TaskType::MileageOnly)
            .with_anchor_text("dashboard")
    }

    fn backend(uri: &str) -> TyphoonOcr {
        TyphoonOcr::new(ResolvedProvider::with_base_url(ProviderKind::Typhoon, uri).with_api_key("ty-key"))
            .unwrap()
    }

    #[tokio::test]
    async fn sends_prompt_and_unwraps_natural_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer ty-key"))
            .and(body_partial_json(json!({ "model": "typhoon-ocr-preview", "max_tokens": 4096 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "{\"natural_text\": \"ODO: 088213 km\"}" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = backend(&server.uri()).recognize(&request()).await.unwrap();
        assert_eq!(text, "ODO: 088213 km");

        let received = server.received_requests().await.unwrap();
        let sent: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        let prompt = sent["messages"][0]["content"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("odometer number"));
        assert!(prompt.contains("RAW_TEXT_START\ndashboard\nRAW_TEXT_END"));
        assert_eq!(
            sent["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,anBlZ2J5dGVz"
        );
    }

    #[tokio::test]
    async fn http_error_is_provider_error_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "error": { "message": "bad key" } })),
            )
            .mount(&server)
            .await;

        match backend(&server.uri()).recognize(&request()).await {
            Err(OcrError::Provider { status, message, .. }) => {
                assert_eq!(status, Some(401));
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_success_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = backend(&server.uri()).recognize(&request()).await.unwrap_err();
        assert!(matches!(err, OcrError::Malformed { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn missing_key_fails_before_sending() {
        let server = MockServer::start().await;
        let typhoon =
            TyphoonOcr::new(ResolvedProvider::with_base_url(ProviderKind::Typhoon, server.uri())).unwrap();
        let err = typhoon.recognize(&request()).await.unwrap_err();
        assert!(matches!(err, OcrError::NotConfigured(..)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Port 9 (discard) is not listening on test hosts.
        let err = backend("http://127.0.0.1:9").recognize(&request()).await.unwrap_err();
        assert!(matches!(err, OcrError::Transport { .. }), "{err:?}");
    }
}
