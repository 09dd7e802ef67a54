use odoscan_core::{reconcile_readings, MileageConfig, OdometerReading, TaskType, TripReconciliation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::extract::OdometerExtractor;
use crate::preprocess::{self, PreprocessError};
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::{ImageInput, OcrRequest};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

/// Which of the two uploads a slot report belongs to. The photos are not
/// assumed to be in trip order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    First,
    Second,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlotReading {
    Found { value: String },
    NotFound,
    Failed { message: String },
}

impl SlotReading {
    pub fn is_found(&self) -> bool {
        matches!(self, SlotReading::Found { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotReport {
    pub slot: Slot,
    #[serde(flatten)]
    pub reading: SlotReading,
    /// Text the provider returned; absent when the call failed.
    pub ocr_text: Option<String>,
}

/// Outcome of one two-photo mileage run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MileageReport {
    pub id: Uuid,
    pub slots: Vec<SlotReport>,
    /// Present only when both slots produced a value.
    pub reconciliation: Option<TripReconciliation>,
}

/// Orchestrates: prepare image → OCR → extract, per photo, then reconcile.
pub struct MileagePipeline<B: OcrBackend> {
    backend: B,
    config: MileageConfig,
    task: TaskType,
    anchor_text: String,
}

impl<B: OcrBackend> MileagePipeline<B> {
    pub fn new(backend: B, config: MileageConfig) -> Self {
        Self { backend, config, task: TaskType::Default, anchor_text: String::new() }
    }

    pub fn with_task(mut self, task: TaskType) -> Self {
        self.task = task;
        self
    }

    pub fn with_anchor_text(mut self, anchor_text: impl Into<String>) -> Self {
        self.anchor_text = anchor_text.into();
        self
    }

    pub fn config(&self) -> &MileageConfig {
        &self.config
    }

    /// Recognize one photo and pull the odometer value out of it. A photo
    /// without a readable value is still `Ok`, with no match.
    pub async fn process_single(&self, image: ImageInput) -> Result<OdometerReading, PipelineError> {
        let image = preprocess::prepare_for_upload(image)?;
        let request = OcrRequest::new(image)
            .with_task(self.task)
            .with_anchor_text(self.anchor_text.clone());
        let text = self.backend.recognize(&request).await?;
        Ok(OdometerExtractor::read(&text))
    }

    /// Read both photos one after the other. A failure on one photo is
    /// recorded in its slot and never stops the other.
    pub async fn process_pair(&self, first: ImageInput, second: ImageInput) -> MileageReport {
        let id = Uuid::new_v4();
        let mut slots = Vec::with_capacity(2);
        let mut readings = Vec::with_capacity(2);

        for (slot, image) in [(Slot::First, first), (Slot::Second, second)] {
            match self.process_single(image).await {
                Ok(reading) => {
                    info!(%id, ?slot, found = reading.is_found(), "odometer read");
                    let outcome = match &reading.matched_value {
                        Some(value) => SlotReading::Found { value: value.clone() },
                        None => SlotReading::NotFound,
                    };
                    slots.push(SlotReport {
                        slot,
                        reading: outcome,
                        ocr_text: Some(reading.raw_text.clone()),
                    });
                    readings.push(Some(reading));
                }
                Err(e) => {
                    warn!(%id, ?slot, provider = %self.backend.provider(), "odometer read failed: {e}");
                    slots.push(SlotReport {
                        slot,
                        reading: SlotReading::Failed { message: e.to_string() },
                        ocr_text: None,
                    });
                    readings.push(None);
                }
            }
        }

        let reconciliation = match (&readings[0], &readings[1]) {
            (Some(a), Some(b)) => reconcile_readings(a, b, &self.config),
            _ => None,
        };

        MileageReport { id, slots, reconciliation }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::{MockOutcome, MockRecognizer};
    use odoscan_core::Money;
    use std::sync::Arc;

    fn photo() -> ImageInput {
        ImageInput::new(b"opaque camera bytes".to_vec(), "image/jpeg").unwrap()
    }

    fn pipeline(outcomes: Vec<MockOutcome>) -> (MileagePipeline<Arc<MockRecognizer>>, Arc<MockRecognizer>) {
        let mock = Arc::new(MockRecognizer::scripted(outcomes));
        (MileagePipeline::new(mock.clone(), MileageConfig::default()), mock)
    }

    #[tokio::test]
    async fn both_found_reconciles() {
        let (p, mock) = pipeline(vec![
            MockOutcome::Text("ODO 045231".into()),
            MockOutcome::Text("odometer: 044980 km".into()),
        ]);
        let report = p.process_pair(photo(), photo()).await;

        assert_eq!(mock.calls(), 2);
        assert_eq!(report.slots[0].reading, SlotReading::Found { value: "045231".into() });
        let rec = report.reconciliation.unwrap();
        assert_eq!((rec.start, rec.end, rec.distance), (44980, 45231, 251));
        assert_eq!(rec.cost, Money::from_units(1506));
        assert!(!rec.over_threshold);
    }

    #[tokio::test]
    async fn one_failed_slot_keeps_the_other() {
        let (p, mock) = pipeline(vec![
            MockOutcome::Text("{\"natural_text\":\"ODO: 088213 km\"}".into()),
            MockOutcome::Unavailable("connection reset".into()),
        ]);
        let report = p.process_pair(photo(), photo()).await;

        assert_eq!(mock.calls(), 2);
        assert_eq!(report.slots[0].slot, Slot::First);
        assert_eq!(report.slots[0].reading, SlotReading::Found { value: "088213".into() });
        assert_eq!(report.slots[0].ocr_text.as_deref(), Some("ODO: 088213 km"));
        assert!(matches!(report.slots[1].reading, SlotReading::Failed { .. }));
        assert_eq!(report.slots[1].ocr_text, None);
        assert!(report.reconciliation.is_none());
    }

    #[tokio::test]
    async fn first_failure_does_not_cancel_second() {
        let (p, _) = pipeline(vec![
            MockOutcome::ProviderError("quota exceeded".into()),
            MockOutcome::Text("10800".into()),
        ]);
        let report = p.process_pair(photo(), photo()).await;
        match &report.slots[0].reading {
            SlotReading::Failed { message } => assert!(message.contains("quota exceeded")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(report.slots[1].reading, SlotReading::Found { value: "10800".into() });
        assert!(report.reconciliation.is_none());
    }

    #[tokio::test]
    async fn not_found_slot_blocks_reconciliation() {
        let (p, _) = pipeline(vec![
            MockOutcome::Text("ODO 10000".into()),
            MockOutcome::Text("blurry dashboard".into()),
        ]);
        let report = p.process_pair(photo(), photo()).await;
        assert_eq!(report.slots[1].reading, SlotReading::NotFound);
        assert!(report.reconciliation.is_none());
    }

    #[tokio::test]
    async fn task_and_anchor_reach_backend() {
        let mock = Arc::new(MockRecognizer::new("ODO 12345"));
        let p = MileagePipeline::new(mock.clone(), MileageConfig::default())
            .with_task(TaskType::MileageOnly)
            .with_anchor_text("odometer");
        let reading = p.process_single(photo()).await.unwrap();
        assert_eq!(reading.value(), Some(12345));
        assert_eq!(mock.tasks(), vec![TaskType::MileageOnly]);
    }

    #[tokio::test]
    async fn single_propagates_backend_error() {
        let (p, _) = pipeline(vec![MockOutcome::Unavailable("timeout".into())]);
        let err = p.process_single(photo()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Ocr(OcrError::Engine(_))));
    }

    #[test]
    fn slot_report_json_shape() {
        let report = SlotReport {
            slot: Slot::Second,
            reading: SlotReading::Found { value: "012345".into() },
            ocr_text: Some("ODO 012345".into()),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "slot": "second",
                "status": "found",
                "value": "012345",
                "ocr_text": "ODO 012345"
            })
        );
    }
}
