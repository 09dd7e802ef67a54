use async_trait::async_trait;
use odoscan_core::{ProviderKind, ResolvedProvider};
use reqwest::multipart::{Form, Part};
use tracing::info;

use super::{http_client, require_key, send};
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::OcrRequest;

/// OCR.space `parse/image`, uploaded as a multipart form.
pub struct OcrSpace {
    client: reqwest::Client,
    config: ResolvedProvider,
}

impl OcrSpace {
    pub fn new(config: ResolvedProvider) -> Result<Self, OcrError> {
        Ok(Self { client: http_client(&config)?, config })
    }
}

#[async_trait]
impl OcrBackend for OcrSpace {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OcrSpace
    }

    async fn recognize(&self, request: &OcrRequest) -> Result<String, OcrError> {
        let key = require_key(&self.config)?.to_string();
        info!(language = %self.config.language, "OCR.space request");

        let file = Part::bytes(request.image.bytes().to_vec())
            .file_name(request.image.file_name())
            .mime_str(request.image.mime_type())
            .map_err(|e| OcrError::InvalidInput(format!("unusable MIME type: {e}")))?;
        let form = Form::new()
            .text("apikey", key)
            .text("language", self.config.language.clone())
            .text("isOverlayRequired", "false")
            .part("file", file);

        let http = self
            .client
            .post(format!("{}/parse/image", self.config.base_url))
            .multipart(form);
        send(ProviderKind::OcrSpace, http).await?.into_text(ProviderKind::OcrSpace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageInput;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(uri: &str) -> OcrSpace {
        OcrSpace::new(ResolvedProvider::with_base_url(ProviderKind::OcrSpace, uri).with_api_key("helloworld"))
            .unwrap()
    }

    fn request() -> OcrRequest {
        OcrRequest::new(ImageInput::new(b"jpegdata".to_vec(), "image/jpeg").unwrap())
    }

    #[tokio::test]
    async fn posts_form_fields_and_reads_parsed_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/parse/image"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ParsedResults": [{ "ParsedText": "ODO 045231\r\n" }],
                "IsErroredOnProcessing": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = backend(&server.uri()).recognize(&request()).await.unwrap();
        assert_eq!(text, "ODO 045231\r\n");

        let received = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&received[0].body);
        assert!(body.contains("name=\"apikey\"\r\n\r\nhelloworld"));
        assert!(body.contains("name=\"language\"\r\n\r\neng"));
        assert!(body.contains("name=\"isOverlayRequired\"\r\n\r\nfalse"));
        assert!(body.contains("filename=\"upload.jpg\""));
    }

    #[tokio::test]
    async fn processing_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "IsErroredOnProcessing": true,
                "ErrorMessage": ["Unable to recognize the file type"]
            })))
            .mount(&server)
            .await;

        match backend(&server.uri()).recognize(&request()).await {
            Err(OcrError::Provider { message, .. }) => {
                assert_eq!(message, "Unable to recognize the file type")
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
