use serde::{Deserialize, Serialize};

use crate::model::{Document, Id};
use crate::report::Report;
use crate::variation::Variations;

/// `POST /experiments`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateExperimentRequest {
    pub name: String,
    pub config: Document,
}

/// `POST /experiments/{id}/runsync`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRequest {
    pub runs: u32,
    pub output_format: String,
}

/// `POST /experiments/batch`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchCreateRequest {
    pub name: String,
    pub config: Document,
    #[serde(
        rename = "variationPaths",
        default,
        skip_serializing_if = "Variations::is_empty"
    )]
    pub variation_paths: Variations,
}

/// `POST /experiments/batch/{id}/run`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchRunRequest {
    pub runs: u32,
    pub output_formats: Vec<String>,
}

/// `POST /experiments/suite`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuiteCreateRequest {
    pub experiments: Vec<Document>,
}

/// `POST /experimentsuite/run`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuiteRunRequest {
    #[serde(rename = "experimentIds")]
    pub experiment_ids: Vec<Id>,
}

/// Minimal shape of every create response; extra fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdResponse {
    pub id: Id,
}

/// `GET /experiments/{id}/report`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportEnvelope {
    #[serde(default)]
    pub report: Report,
}

/// How many runs to execute and in which format results are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    pub runs: u32,
    pub output_format: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            runs: 1,
            output_format: "json".to_string(),
        }
    }
}

impl RunOptions {
    pub fn single_run_request(&self) -> RunRequest {
        RunRequest {
            runs: self.runs,
            output_format: self.output_format.clone(),
        }
    }

    pub fn batch_run_request(&self) -> BatchRunRequest {
        BatchRunRequest {
            runs: self.runs,
            output_formats: vec![self.output_format.clone()],
        }
    }
}

/// Backend routes, relative to the configured base URL.
pub mod paths {
    pub const EXPERIMENTS: &str = "/experiments";
    pub const BATCH: &str = "/experiments/batch";
    pub const SUITE: &str = "/experiments/suite";
    pub const SUITE_RUN: &str = "/experimentsuite/run";
    pub const ANALYSIS_DATA: &str = "/analysis-data";

    pub fn run_sync(id: &str) -> String {
        format!("/experiments/{id}/runsync")
    }

    pub fn batch_run(id: &str) -> String {
        format!("/experiments/batch/{id}/run")
    }

    pub fn status(id: &str) -> String {
        format!("/experiments/{id}/status")
    }

    pub fn report(id: &str) -> String {
        format!("/experiments/{id}/report")
    }

    pub fn fault_detection(id: &str) -> String {
        format!("/experiments/{id}/analyse-fault-detection")
    }

    pub fn raw_detections(id: &str) -> String {
        format!("/experiments/{id}/raw-detections")
    }

    pub fn analysis_data(id: Option<&str>) -> String {
        match id {
            Some(id) => format!("{ANALYSIS_DATA}/{id}"),
            None => ANALYSIS_DATA.to_string(),
        }
    }

    pub fn config(id: &str) -> String {
        format!("/experiments/{id}/config")
    }

    pub fn benchmark(id: &str) -> String {
        format!("/experiments/{id}/benchmark")
    }

    pub fn data(id: &str) -> String {
        format!("/experiments/{id}/data")
    }
}
