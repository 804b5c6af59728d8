//! Experiment reports and their flattening into table rows.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Nested run report. Maps keep the backend's insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Report {
    #[serde(default)]
    pub runs: Option<IndexMap<String, RunData>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunData {
    #[serde(default)]
    pub interactions: Option<IndexMap<String, Interaction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loadgen: Option<LoadgenSummary>,
}

/// One treatment/response pairing recorded within a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    #[serde(default)]
    pub treatment_name: Option<String>,
    #[serde(default)]
    pub treatment_type: Option<String>,
    #[serde(default)]
    pub treatment_start: Option<String>,
    #[serde(default)]
    pub treatment_end: Option<String>,
    #[serde(default)]
    pub response_name: Option<String>,
    #[serde(default)]
    pub response_type: Option<String>,
    #[serde(default)]
    pub response_start: Option<String>,
    #[serde(default)]
    pub response_end: Option<String>,
    #[serde(default)]
    pub store_key: Option<String>,
}

/// Load generator totals for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoadgenSummary {
    #[serde(default)]
    pub loadgen_start_time: Option<String>,
    #[serde(default)]
    pub loadgen_end_time: Option<String>,
    #[serde(default)]
    pub loadgen_total_requests: Option<u64>,
    #[serde(default)]
    pub loadgen_total_failures: Option<u64>,
}

/// An [`Interaction`] tagged with where it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionRow {
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(rename = "interactionId")]
    pub interaction_id: String,
    #[serde(flatten)]
    pub interaction: Interaction,
}

/// Per-run overview: interaction count plus load generator totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummaryRow {
    #[serde(rename = "runId")]
    pub run_id: String,
    pub interactions: usize,
    #[serde(flatten)]
    pub loadgen: LoadgenSummary,
}

impl Report {
    /// One row per `(run, interaction)`, runs in order, then interactions in order.
    ///
    /// Missing `runs` or a run without `interactions` yields no rows for it.
    pub fn interaction_rows(&self) -> Vec<InteractionRow> {
        let Some(runs) = &self.runs else {
            return Vec::new();
        };
        runs.iter()
            .flat_map(|(run_id, run)| {
                run.interactions
                    .iter()
                    .flatten()
                    .map(move |(interaction_id, interaction)| InteractionRow {
                        run_id: run_id.clone(),
                        interaction_id: interaction_id.clone(),
                        interaction: interaction.clone(),
                    })
            })
            .collect()
    }

    pub fn run_summaries(&self) -> Vec<RunSummaryRow> {
        self.runs
            .iter()
            .flatten()
            .map(|(run_id, run)| RunSummaryRow {
                run_id: run_id.clone(),
                interactions: run.interactions.as_ref().map_or(0, IndexMap::len),
                loadgen: run.loadgen.clone().unwrap_or_default(),
            })
            .collect()
    }
}
