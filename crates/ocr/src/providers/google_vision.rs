use async_trait::async_trait;
use odoscan_core::{ProviderKind, ResolvedProvider};
use serde_json::json;
use tracing::info;

use super::{http_client, require_key, send};
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::OcrRequest;

/// Google Cloud Vision `TEXT_DETECTION`. Ignores task and anchor text.
pub struct GoogleVision {
    client: reqwest::Client,
    config: ResolvedProvider,
}

impl GoogleVision {
    pub fn new(config: ResolvedProvider) -> Result<Self, OcrError> {
        Ok(Self { client: http_client(&config)?, config })
    }
}

#[async_trait]
impl OcrBackend for GoogleVision {
    fn provider(&self) -> ProviderKind {
        ProviderKind::GoogleVision
    }

    async fn recognize(&self, request: &OcrRequest) -> Result<String, OcrError> {
        let key = require_key(&self.config)?;
        info!(bytes = request.image.bytes().len(), "Google Vision text detection");

        let body = json!({
            "requests": [{
                "image": { "content": request.image.to_base64() },
                "features": [{ "type": "TEXT_DETECTION" }]
            }]
        });

        let http = self
            .client
            .post(format!("{}/v1/images:annotate", self.config.base_url))
            .query(&[("key", key)])
            .json(&body);
        send(ProviderKind::GoogleVision, http).await?.into_text(ProviderKind::GoogleVision)
    }
}
