use std::sync::Arc;

use anyhow::Context;
use odoscan_core::{AppConfig, ProviderKind};
use odoscan_journal::{Summarizer, TextExtractor};
use odoscan_ocr::{build_chat_backend, build_ocr_backend, ChatBackend, FallbackRecognizer, MileagePipeline, OcrBackend};

/// Shared per-process state: configuration plus one backend per flow.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Serves the raw Typhoon OCR endpoint.
    pub typhoon: Arc<dyn OcrBackend>,
    pub mileage: Arc<dyn OcrBackend>,
    /// Document OCR, already wrapped with its fallback when one is configured.
    pub document: Arc<dyn OcrBackend>,
    pub chat: Arc<dyn ChatBackend>,
    pub image_analysis: Arc<dyn ChatBackend>,
    pub deepseek: Arc<dyn ChatBackend>,
    pub gemini: Arc<dyn ChatBackend>,
    pub summarizer: Arc<dyn Summarizer>,
    /// PDF and Word uploads.
    pub extractor: Arc<dyn TextExtractor>,
}

impl AppState {
    /// Build every backend from configuration. API keys are checked per
    /// request, so a missing key only fails the flows that need it.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let routing = &config.routing;
        let ocr = |kind: ProviderKind| {
            build_ocr_backend(&config.provider(kind)).with_context(|| format!("building {kind} OCR backend"))
        };
        let chat = |kind: ProviderKind| {
            build_chat_backend(&config.provider(kind)).with_context(|| format!("building {kind} chat backend"))
        };

        let document = match routing.document_fallback {
            Some(secondary) => Arc::new(
                FallbackRecognizer::new(ocr(routing.document_backend)?, ocr(secondary)?)
                    .with_secondary_task(routing.document_fallback_task, routing.document_anchor_text.clone()),
            ) as Arc<dyn OcrBackend>,
            None => ocr(routing.document_backend)?,
        };

        let summarizer =
            odoscan_journal::summarizer_from_config(&config.summarizer).context("building summarizer")?;
        let extractor =
            odoscan_journal::text_extractor_from_config(&config.upload).context("building document extractor")?;

        Ok(Self {
            typhoon: ocr(ProviderKind::Typhoon)?,
            mileage: ocr(routing.mileage_backend)?,
            document,
            chat: chat(routing.chat_backend)?,
            image_analysis: chat(routing.image_analysis_backend)?,
            deepseek: chat(ProviderKind::DeepSeek)?,
            gemini: chat(ProviderKind::Gemini)?,
            summarizer,
            extractor,
            config: Arc::new(config),
        })
    }

    pub fn mileage_pipeline(&self) -> MileagePipeline<Arc<dyn OcrBackend>> {
        MileagePipeline::new(self.mileage.clone(), self.config.mileage)
            .with_task(self.config.routing.mileage_task)
            .with_anchor_text(self.config.routing.mileage_anchor_text.clone())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use odoscan_journal::{NativeSummarizer, NoExtractor};
    use odoscan_ocr::{MockChat, MockRecognizer};

    /// State where every backend is a mock answering `text` / `reply`.
    pub fn mock_state(ocr: MockRecognizer, reply: MockChat) -> AppState {
        let ocr: Arc<dyn OcrBackend> = Arc::new(ocr);
        let chat: Arc<dyn ChatBackend> = Arc::new(reply);
        AppState {
            config: Arc::new(AppConfig::default()),
            typhoon: ocr.clone(),
            mileage: ocr.clone(),
            document: ocr,
            chat: chat.clone(),
            image_analysis: chat.clone(),
            deepseek: chat.clone(),
            gemini: chat,
            summarizer: Arc::new(NativeSummarizer),
            extractor: Arc::new(NoExtractor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_without_keys() {
        let state = AppState::from_config(AppConfig::default()).unwrap();
        assert_eq!(state.mileage.provider(), ProviderKind::Typhoon);
        assert_eq!(state.document.provider(), ProviderKind::GoogleVision);
        assert_eq!(state.chat.provider(), ProviderKind::OpenAi);
        assert_eq!(state.image_analysis.provider(), ProviderKind::HuggingFace);
        assert_eq!(state.summarizer.name(), "native");
        assert_eq!(state.extractor.name(), "none");
    }

    #[test]
    fn ocr_only_chat_backend_is_rejected() {
        let mut config = AppConfig::default();
        config.routing.chat_backend = ProviderKind::OcrSpace;
        assert!(AppState::from_config(config).is_err());
    }
}
