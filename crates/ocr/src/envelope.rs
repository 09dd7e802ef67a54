//! Vendor response decoding.
//!
//! Every OCR-capable vendor wraps its text differently. Bodies are decoded
//! once into [`ResponseEnvelope`] and turned into plain text there, so no
//! call site has to probe optional fields itself.

use std::borrow::Cow;

use odoscan_core::ProviderKind;
use serde::Deserialize;
use serde_json::Value;

use crate::recognizer::OcrError;

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OcrSpaceResult {
    #[serde(rename = "ParsedText", default)]
    pub parsed_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VisionResponse {
    #[serde(rename = "fullTextAnnotation", default)]
    pub full_text_annotation: Option<VisionFullText>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct VisionFullText {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiContent {
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: Option<String>,
}

/// The response shapes seen across vendors. Variant order matters: an
/// `error` field wins over anything else in the body.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Failure {
        error: Value,
    },
    /// OpenAI-compatible `choices[0].message.content` (OpenAI, HuggingFace router, Typhoon).
    Chat {
        choices: Vec<ChatChoice>,
    },
    /// OCR.space `ParsedResults[0].ParsedText`.
    OcrSpace {
        #[serde(rename = "IsErroredOnProcessing")]
        is_errored: bool,
        #[serde(rename = "ParsedResults", default)]
        parsed_results: Vec<OcrSpaceResult>,
        #[serde(rename = "ErrorMessage", default)]
        error_message: Value,
    },
    /// Google Vision `responses[0].fullTextAnnotation.text`.
    Vision {
        responses: Vec<VisionResponse>,
    },
    /// Gemini `candidates[0].content.parts[*].text`.
    Gemini {
        candidates: Vec<GeminiCandidate>,
    },
    NaturalText {
        natural_text: String,
    },
}

impl ResponseEnvelope {
    pub fn decode(provider: ProviderKind, body: &str) -> Result<Self, OcrError> {
        let value: Value = serde_json::from_str(body).map_err(|e| OcrError::Malformed {
            provider,
            reason: format!("body is not JSON: {e}"),
        })?;
        serde_json::from_value(value).map_err(|_| OcrError::Malformed {
            provider,
            reason: "unrecognised response shape".to_string(),
        })
    }

    pub fn shape(&self) -> &'static str {
        match self {
            ResponseEnvelope::Failure { .. } => "failure",
            ResponseEnvelope::Chat { .. } => "chat",
            ResponseEnvelope::OcrSpace { .. } => "ocr_space",
            ResponseEnvelope::Vision { .. } => "vision",
            ResponseEnvelope::Gemini { .. } => "gemini",
            ResponseEnvelope::NaturalText { .. } => "natural_text",
        }
    }

    /// Pull the recognized text out of the envelope.
    ///
    /// Vendor-reported errors become [`OcrError::Provider`]; a shape that
    /// parses but carries no text becomes [`OcrError::Malformed`]. A Vision
    /// response without annotations means the image has no text and yields
    /// an empty string.
    pub fn into_text(self, provider: ProviderKind) -> Result<String, OcrError> {
        let malformed = |reason: &str| OcrError::Malformed { provider, reason: reason.to_string() };

        match self {
            ResponseEnvelope::Failure { error } => Err(OcrError::Provider {
                provider,
                status: None,
                message: error_message(&error),
            }),
            ResponseEnvelope::Chat { choices } => {
                let content = choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message)
                    .and_then(|m| m.content)
                    .ok_or_else(|| malformed("missing choices[0].message.content"))?;
                Ok(unwrap_natural_text(content.trim()).into_owned())
            }
            ResponseEnvelope::OcrSpace { is_errored, parsed_results, error_message: msg } => {
                if is_errored {
                    return Err(OcrError::Provider {
                        provider,
                        status: None,
                        message: error_message(&msg),
                    });
                }
                parsed_results
                    .into_iter()
                    .next()
                    .and_then(|r| r.parsed_text)
                    .ok_or_else(|| malformed("missing ParsedResults[0].ParsedText"))
            }
            ResponseEnvelope::Vision { responses } => {
                let first = responses
                    .into_iter()
                    .next()
                    .ok_or_else(|| malformed("empty responses array"))?;
                if let Some(err) = first.error {
                    return Err(OcrError::Provider {
                        provider,
                        status: None,
                        message: error_message(&err),
                    });
                }
                Ok(first.full_text_annotation.map(|a| a.text).unwrap_or_default())
            }
            ResponseEnvelope::Gemini { candidates } => {
                let parts = candidates
                    .into_iter()
                    .next()
                    .and_then(|c| c.content)
                    .map(|c| c.parts)
                    .ok_or_else(|| malformed("missing candidates[0].content"))?;
                let text: String = parts.into_iter().filter_map(|p| p.text).collect();
                if text.is_empty() {
                    return Err(malformed("candidate has no text parts"));
                }
                Ok(unwrap_natural_text(text.trim()).into_owned())
            }
            ResponseEnvelope::NaturalText { natural_text } => Ok(natural_text),
        }
    }
}

/// Human-readable message out of a vendor `error` value: a bare string,
/// an object with `message`, a list of strings, or anything else verbatim.
pub fn error_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("message") {
            Some(Value::String(s)) => s.clone(),
            _ => error.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join("; "),
        Value::Null => "unknown error".to_string(),
        other => other.to_string(),
    }
}

/// Some models answer with a JSON document holding the real text under
/// `natural_text`. Return that text when present and non-empty, otherwise
/// the input unchanged.
pub fn unwrap_natural_text(text: &str) -> Cow<'_, str> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => match map.get("natural_text") {
            Some(Value::String(inner)) if !inner.is_empty() => Cow::Owned(inner.clone()),
            _ => Cow::Borrowed(text),
        },
        _ => Cow::Borrowed(text),
    }
}
