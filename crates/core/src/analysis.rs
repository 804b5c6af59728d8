//! Per-service analysis maps flattened into chartable rows.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Payload of `GET /analysis-data[/{id}]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisData {
    #[serde(default)]
    pub metrics: IndexMap<String, ServiceMetrics>,
    #[serde(default)]
    pub probability: IndexMap<String, ServiceProbability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceMetrics {
    #[serde(default)]
    pub micro_f1_score: Option<f64>,
    #[serde(default)]
    pub micro_precision: Option<f64>,
    #[serde(default)]
    pub micro_recall: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceProbability {
    #[serde(rename = "faultyError", default)]
    pub faulty_error: Option<f64>,
    #[serde(rename = "faultyNoError", default)]
    pub faulty_no_error: Option<f64>,
    #[serde(rename = "goodError", default)]
    pub good_error: Option<f64>,
    #[serde(rename = "goodNoError", default)]
    pub good_no_error: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsRow {
    pub service: String,
    #[serde(flatten)]
    pub metrics: ServiceMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbabilityRow {
    pub service: String,
    #[serde(flatten)]
    pub probability: ServiceProbability,
}

pub fn metrics_rows(metrics: &IndexMap<String, ServiceMetrics>) -> Vec<MetricsRow> {
    metrics
        .iter()
        .map(|(service, m)| MetricsRow {
            service: service.clone(),
            metrics: m.clone(),
        })
        .collect()
}

pub fn probability_rows(probability: &IndexMap<String, ServiceProbability>) -> Vec<ProbabilityRow> {
    probability
        .iter()
        .map(|(service, p)| ProbabilityRow {
            service: service.clone(),
            probability: p.clone(),
        })
        .collect()
}

impl AnalysisData {
    pub fn metrics_rows(&self) -> Vec<MetricsRow> {
        metrics_rows(&self.metrics)
    }

    pub fn probability_rows(&self) -> Vec<ProbabilityRow> {
        probability_rows(&self.probability)
    }
}
