use crate::time::{self, Timestamp};
use serde::{Deserialize, Serialize};

/// Backend-assigned experiment identifier.
pub type Id = String;

/// An opaque, parsed configuration document (YAML or JSON).
pub type Document = serde_json::Value;

/// Lifecycle status shared by experiments and their analysis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExperimentStatus {
    #[default]
    Pending,
    NotStarted,
    InProgress,
    Completed,
    Failed,
    /// Analysis was not requested for this experiment.
    NotEnabled,
    /// Any status string this client does not know about.
    #[serde(other)]
    Unknown,
}

impl ExperimentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::NotEnabled)
    }
}

/// One backend-tracked trial.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experiment {
    /// Absent until create succeeds.
    #[serde(default)]
    pub id: Option<Id>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Document>,
    #[serde(default)]
    pub status: ExperimentStatus,
    #[serde(default)]
    pub analysis_status: Option<ExperimentStatus>,
    #[serde(default, with = "time::lenient")]
    pub created_at: Option<Timestamp>,
    #[serde(default, with = "time::lenient")]
    pub started_at: Option<Timestamp>,
    #[serde(default, with = "time::lenient")]
    pub completed_at: Option<Timestamp>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl Experiment {
    /// A not-yet-created experiment draft.
    pub fn draft(name: impl Into<String>, config: Document) -> Self {
        Self {
            id: None,
            name: name.into(),
            config: Some(config),
            status: ExperimentStatus::Pending,
            analysis_status: None,
            created_at: None,
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id)
    }
}

/// Status payload returned by `GET /experiments/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusUpdate {
    #[serde(default)]
    pub id: Option<Id>,
    pub status: ExperimentStatus,
    #[serde(default)]
    pub analysis_status: Option<ExperimentStatus>,
    #[serde(default, with = "time::lenient")]
    pub completed_at: Option<Timestamp>,
}

/// One row of `GET /experiments/{id}/analyse-fault-detection`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaultDetectionRow {
    pub fault_name: String,
    pub detected: bool,
    #[serde(default)]
    pub detection_time: Option<String>,
    #[serde(default)]
    pub detection_latency: Option<f64>,
    #[serde(default)]
    pub true_positives: Vec<Document>,
    #[serde(default)]
    pub false_positives: Vec<Document>,
}

impl FaultDetectionRow {
    pub fn true_positive_count(&self) -> usize {
        self.true_positives.len()
    }

    pub fn false_positive_count(&self) -> usize {
        self.false_positives.len()
    }
}
