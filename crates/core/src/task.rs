use serde::{Deserialize, Serialize};

/// What a recognition call is asked to produce. Prompt-driven backends pick
/// their instructions from this; plain OCR engines ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Full page as markdown.
    #[default]
    Default,
    /// Layout-preserving markdown with HTML tables and figure analysis.
    Structure,
    /// Only the odometer number.
    MileageOnly,
    /// Key financial figures only.
    Summary,
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskType::Default => write!(f, "default"),
            TaskType::Structure => write!(f, "structure"),
            TaskType::MileageOnly => write!(f, "mileage_only"),
            TaskType::Summary => write!(f, "summary"),
        }
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(TaskType::Default),
            "structure" => Ok(TaskType::Structure),
            "mileage_only" => Ok(TaskType::MileageOnly),
            "summary" => Ok(TaskType::Summary),
            other => Err(format!("Unknown task type: '{other}'")),
        }
    }
}
