//! Application configuration.
//!
//! Loaded from a TOML file where every section is optional. Provider API
//! keys never live in the file: each provider names the environment
//! variable holding its key, resolved when the provider is built.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::mileage::MileageConfig;
use crate::task::TaskType;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

// ── Providers ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Typhoon,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "huggingface")]
    HuggingFace,
    #[serde(rename = "deepseek")]
    DeepSeek,
    GoogleVision,
    Gemini,
    OcrSpace,
    Tesseract,
    Mock,
}

impl ProviderKind {
    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::Typhoon => "https://api.opentyphoon.ai/v1",
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::HuggingFace | ProviderKind::DeepSeek => {
                "https://router.huggingface.co/novita/v3/openai"
            }
            ProviderKind::GoogleVision => "https://vision.googleapis.com",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
            ProviderKind::OcrSpace => "https://api.ocr.space",
            ProviderKind::Tesseract | ProviderKind::Mock => "",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Typhoon => "typhoon-ocr-preview",
            ProviderKind::OpenAi => "gpt-4o",
            ProviderKind::HuggingFace => "meta-llama/llama-4-scout-17b-16e-instruct",
            ProviderKind::DeepSeek => "DeepSeek-R1",
            ProviderKind::Gemini => "gemini-1.5-pro",
            ProviderKind::GoogleVision | ProviderKind::OcrSpace => "",
            ProviderKind::Tesseract => "eng",
            ProviderKind::Mock => "mock",
        }
    }

    pub fn default_key_env(self) -> Option<&'static str> {
        match self {
            ProviderKind::Typhoon => Some("TYPHOON_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::HuggingFace | ProviderKind::DeepSeek => Some("HF_API_KEY"),
            ProviderKind::GoogleVision => Some("GOOGLE_AI_KEY_API"),
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::OcrSpace => Some("OCR_SPACE_API_KEY"),
            ProviderKind::Tesseract | ProviderKind::Mock => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Typhoon => write!(f, "typhoon"),
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::HuggingFace => write!(f, "huggingface"),
            ProviderKind::DeepSeek => write!(f, "deepseek"),
            ProviderKind::GoogleVision => write!(f, "google_vision"),
            ProviderKind::Gemini => write!(f, "gemini"),
            ProviderKind::OcrSpace => write!(f, "ocr_space"),
            ProviderKind::Tesseract => write!(f, "tesseract"),
            ProviderKind::Mock => write!(f, "mock"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "typhoon" => Ok(ProviderKind::Typhoon),
            "openai" => Ok(ProviderKind::OpenAi),
            "huggingface" => Ok(ProviderKind::HuggingFace),
            "deepseek" => Ok(ProviderKind::DeepSeek),
            "google_vision" => Ok(ProviderKind::GoogleVision),
            "gemini" => Ok(ProviderKind::Gemini),
            "ocr_space" => Ok(ProviderKind::OcrSpace),
            "tesseract" => Ok(ProviderKind::Tesseract),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(format!("Unknown provider: '{other}'")),
        }
    }
}

/// Per-provider overrides. Anything left out falls back to the
/// provider's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key_env: Option<String>,
    pub request_timeout_secs: Option<u64>,
    /// OCR language hint (OCR.space, Tesseract).
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub typhoon: ProviderSection,
    pub openai: ProviderSection,
    pub huggingface: ProviderSection,
    pub deepseek: ProviderSection,
    pub google_vision: ProviderSection,
    pub gemini: ProviderSection,
    pub ocr_space: ProviderSection,
    pub tesseract: ProviderSection,
}

impl ProvidersConfig {
    pub fn section(&self, kind: ProviderKind) -> Option<&ProviderSection> {
        match kind {
            ProviderKind::Typhoon => Some(&self.typhoon),
            ProviderKind::OpenAi => Some(&self.openai),
            ProviderKind::HuggingFace => Some(&self.huggingface),
            ProviderKind::DeepSeek => Some(&self.deepseek),
            ProviderKind::GoogleVision => Some(&self.google_vision),
            ProviderKind::Gemini => Some(&self.gemini),
            ProviderKind::OcrSpace => Some(&self.ocr_space),
            ProviderKind::Tesseract => Some(&self.tesseract),
            ProviderKind::Mock => None,
        }
    }
}

/// A provider's effective settings after defaults and environment lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    pub kind: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub request_timeout: Option<Duration>,
    pub language: String,
}

impl ResolvedProvider {
    /// Defaults only, no key. Handy for tests pointing at a local server.
    pub fn with_base_url(kind: ProviderKind, base_url: impl Into<String>) -> Self {
        Self {
            kind,
            base_url: base_url.into(),
            model: kind.default_model().to_string(),
            api_key: None,
            request_timeout: None,
            language: "eng".to_string(),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

// ── Other sections ───────────────────────────────────────────────────────────

/// Who to contact when a trip cost crosses the alert threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    pub approver: String,
    pub phone: String,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self { approver: "the travel approver".to_string(), phone: String::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1:3000".to_string(), body_limit_bytes: 10 * 1024 * 1024 }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("server.bind '{}': {e}", self.bind)))
    }
}

/// External journal summarizer. An empty command selects the built-in one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub command: Vec<String>,
}

/// Text extraction for uploaded PDF and Word files. The command receives the
/// file path and prints plain text; an empty command means those uploads are
/// refused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub document_command: Vec<String>,
}

/// Which provider serves which flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub mileage_backend: ProviderKind,
    pub mileage_task: TaskType,
    pub mileage_anchor_text: String,
    pub document_backend: ProviderKind,
    pub document_fallback: Option<ProviderKind>,
    pub document_fallback_task: TaskType,
    pub document_anchor_text: String,
    pub chat_backend: ProviderKind,
    pub image_analysis_backend: ProviderKind,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            mileage_backend: ProviderKind::Typhoon,
            mileage_task: TaskType::Default,
            mileage_anchor_text: "odometer".to_string(),
            document_backend: ProviderKind::GoogleVision,
            document_fallback: Some(ProviderKind::Typhoon),
            document_fallback_task: TaskType::Summary,
            document_anchor_text: "invoice".to_string(),
            chat_backend: ProviderKind::OpenAi,
            image_analysis_backend: ProviderKind::HuggingFace,
        }
    }
}

// ── Root ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mileage: MileageConfig,
    pub advisory: AdvisoryConfig,
    pub server: ServerConfig,
    pub routing: RoutingConfig,
    pub summarizer: SummarizerConfig,
    pub upload: UploadConfig,
    pub providers: ProvidersConfig,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&content)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mileage.rate_per_unit.is_sign_negative() {
            return Err(ConfigError::Invalid("mileage.rate_per_unit must not be negative".into()));
        }
        if self.mileage.alert_threshold.is_sign_negative() {
            return Err(ConfigError::Invalid("mileage.alert_threshold must not be negative".into()));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(ConfigError::Invalid("server.body_limit_bytes must be positive".into()));
        }
        self.server.bind_addr()?;
        Ok(())
    }

    pub fn provider(&self, kind: ProviderKind) -> ResolvedProvider {
        self.provider_with_env(kind, |name| std::env::var(name).ok())
    }

    /// Resolve a provider with an explicit environment lookup.
    pub fn provider_with_env(
        &self,
        kind: ProviderKind,
        env: impl Fn(&str) -> Option<String>,
    ) -> ResolvedProvider {
        let section = self.providers.section(kind).cloned().unwrap_or_default();

        let key_env = section.api_key_env.as_deref().or(kind.default_key_env());
        let api_key = key_env.and_then(&env).filter(|k| !k.trim().is_empty());

        ResolvedProvider {
            kind,
            base_url: section
                .base_url
                .unwrap_or_else(|| kind.default_base_url().to_string())
                .trim_end_matches('/')
                .to_string(),
            model: section.model.unwrap_or_else(|| kind.default_model().to_string()),
            api_key,
            request_timeout: section.request_timeout_secs.map(Duration::from_secs),
            language: section.language.unwrap_or_else(|| "eng".to_string()),
        }
    }
}
