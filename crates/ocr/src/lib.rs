pub mod chat;
pub mod envelope;
pub mod extract;
pub mod fallback;
pub mod pipeline;
pub mod preprocess;
pub mod prompts;
pub mod providers;
pub mod recognizer;
pub mod types;

pub use chat::{ChatBackend, ChatMessage, MockChat, Role};
pub use envelope::ResponseEnvelope;
pub use extract::OdometerExtractor;
pub use fallback::{FallbackRecognizer, Recognized};
pub use pipeline::{MileagePipeline, MileageReport, PipelineError, Slot, SlotReading, SlotReport};
pub use preprocess::{prepare_for_upload, PreprocessError};
pub use providers::{build_chat_backend, build_ocr_backend};
pub use recognizer::{ErrorKind, MockOutcome, MockRecognizer, OcrBackend, OcrError};
pub use types::{ImageInput, OcrRequest};
