//! Payment-journal summaries from OCR text, and plain text out of uploaded
//! documents.

pub mod digest;
pub mod relay;
pub mod summarizer;
pub mod summary;
pub mod text;

pub use digest::digest;
pub use relay::{RelayError, ScriptRelay};
pub use summarizer::{from_config as summarizer_from_config, NativeSummarizer, Summarizer};
pub use summary::{Insight, JournalEntry, JournalSummary};
pub use text::{from_config as text_extractor_from_config, CommandExtractor, NoExtractor, TextError, TextExtractor};
