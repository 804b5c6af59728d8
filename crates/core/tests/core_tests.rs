//! Integration tests for the core crate.

use std::sync::Arc;

use oxn_core::{
    metrics_rows, probability_rows, AnalysisData, Experiment, ExperimentCollection,
    ExperimentMode, ExperimentStatus, ExtensionFilter, Report, SelectedFile, StatusUpdate,
    Variations,
};
use serde_json::json;

#[test]
fn test_experiment_status_serde() {
    let s = ExperimentStatus::InProgress;
    let serialized = serde_json::to_string(&s).unwrap();
    assert_eq!(serialized, r#""IN_PROGRESS""#);
    let deserialized: ExperimentStatus = serde_json::from_str(&serialized).unwrap();
    assert_eq!(deserialized, s);

    let not_enabled: ExperimentStatus = serde_json::from_str(r#""NOT_ENABLED""#).unwrap();
    assert_eq!(not_enabled, ExperimentStatus::NotEnabled);
    assert!(not_enabled.is_terminal());
}

#[test]
fn test_experiment_mode_serde() {
    let serialized = serde_json::to_string(&ExperimentMode::Suite).unwrap();
    assert_eq!(serialized, r#""suite""#);
    assert!(ExperimentMode::Suite.allows_multiple());
    assert!(!ExperimentMode::Batch.allows_multiple());
}

#[test]
fn extension_filter_keeps_order_and_ignores_case() {
    let filter = ExtensionFilter::new([".yaml", ".yml"]);
    let files = ["a.yaml", "b.txt", "c.YML"]
        .into_iter()
        .map(SelectedFile::from_path)
        .collect();
    let kept: Vec<String> = filter
        .select(files, true)
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(kept, ["a.yaml", "c.YML"]);
}

#[test]
fn report_with_two_runs_flattens_to_four_rows() {
    let raw = json!({
        "runs": {
            "run_1": {
                "interactions": {
                    "interaction_0": {"treatment_name": "empty_treatment", "response_name": "frontend_traces", "store_key": "k0"},
                    "interaction_1": {"treatment_name": "delay", "response_name": "frontend_traces", "store_key": "k1"},
                    "interaction_2": {"treatment_name": "kill", "response_name": "system_CPU", "store_key": "k2"}
                },
                "loadgen": {"loadgen_total_requests": 39533, "loadgen_total_failures": 103}
            },
            "run_0": {
                "interactions": {
                    "interaction_9": {"treatment_name": "delay", "treatment_type": "DelayTreatment"}
                }
            }
        }
    });
    let report: Report = serde_json::from_value(raw).unwrap();
    let rows = report.interaction_rows();

    let tags: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r.run_id.as_str(), r.interaction_id.as_str()))
        .collect();
    assert_eq!(
        tags,
        [
            ("run_1", "interaction_0"),
            ("run_1", "interaction_1"),
            ("run_1", "interaction_2"),
            ("run_0", "interaction_9"),
        ]
    );
    assert_eq!(rows[2].interaction.treatment_name.as_deref(), Some("kill"));
    assert_eq!(rows[3].interaction.treatment_type.as_deref(), Some("DelayTreatment"));

    let row = serde_json::to_value(&rows[0]).unwrap();
    assert_eq!(row["runId"], "run_1");
    assert_eq!(row["interactionId"], "interaction_0");
    assert_eq!(row["store_key"], "k0");

    let summaries = report.run_summaries();
    assert_eq!(summaries[0].interactions, 3);
    assert_eq!(summaries[0].loadgen.loadgen_total_failures, Some(103));
    assert_eq!(summaries[1].loadgen.loadgen_total_requests, None);
}

#[test]
fn report_run_without_interactions_is_skipped() {
    let report: Report = serde_json::from_value(json!({
        "runs": {"a": {"interactions": null}, "b": {"interactions": {"i": {}}}}
    }))
    .unwrap();
    let rows = report.interaction_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].run_id, "b");
}

#[test]
fn batch_cross_product_is_row_major() {
    let base = json!({"a": 1, "b": 2});
    let variations = Variations::new()
        .with("b", vec![json!(2), json!(3)])
        .with("a", vec![json!(1), json!(9)]);

    assert_eq!(variations.combination_count(), Ok(4));
    let docs = variations.expand(&base).unwrap();
    assert_eq!(
        docs,
        vec![
            json!({"a": 1, "b": 2}),
            json!({"a": 1, "b": 3}),
            json!({"a": 9, "b": 2}),
            json!({"a": 9, "b": 3}),
        ]
    );
}

#[test]
fn no_variations_expand_to_base_only() {
    let base = json!({"experiment": {"name": "big"}});
    let docs = Variations::new().expand(&base).unwrap();
    assert_eq!(docs, vec![base]);
}

#[test]
fn three_axis_cross_product_covers_every_combination_once() {
    let base = json!({"x": 0, "y": 0, "z": {"w": 0}});
    let variations = Variations::new()
        .with("x", vec![json!(1), json!(2)])
        .with("y", vec![json!(1), json!(2), json!(3)])
        .with("z.w", vec![json!("p"), json!("q")]);
    let docs = variations.expand(&base).unwrap();
    assert_eq!(docs.len(), 12);

    let mut seen: Vec<String> = docs.iter().map(|d| d.to_string()).collect();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 12);

    // last path varies fastest
    assert_eq!(docs[0]["z"]["w"], "p");
    assert_eq!(docs[1]["z"]["w"], "q");
    assert_eq!(docs[1]["y"], 1);
    assert_eq!(docs[11], json!({"x": 2, "y": 3, "z": {"w": "q"}}));
}

fn experiment(id: &str, name: &str) -> Experiment {
    let mut e = Experiment::draft(name, json!({"experiment": {"name": name}}));
    e.id = Some(id.to_string());
    e.created_at = oxn_core::parse_timestamp("2024-12-10T13:21:02Z");
    e.started_at = oxn_core::parse_timestamp("2024-12-10T13:22:02Z");
    e
}

#[test]
fn status_merge_replaces_only_matching_row() {
    let before = ExperimentCollection::new(vec![
        experiment("A", "alpha"),
        experiment("B", "beta"),
        experiment("C", "gamma"),
    ]);
    let update = StatusUpdate {
        id: Some("B".into()),
        status: ExperimentStatus::Completed,
        analysis_status: Some(ExperimentStatus::Completed),
        completed_at: None,
    };
    let after = before.with_status("B", &update);

    let old: Vec<_> = before.iter().collect();
    let new: Vec<_> = after.iter().collect();
    assert!(Arc::ptr_eq(old[0], new[0]));
    assert!(Arc::ptr_eq(old[2], new[2]));
    assert!(!Arc::ptr_eq(old[1], new[1]));
    assert_eq!(
        serde_json::to_vec(&**old[0]).unwrap(),
        serde_json::to_vec(&**new[0]).unwrap()
    );

    let b = after.get("B").unwrap();
    assert_eq!(b.status, ExperimentStatus::Completed);
    assert_eq!(b.analysis_status, Some(ExperimentStatus::Completed));
    assert_eq!(b.name, "beta");
    assert_eq!(b.created_at, old[1].created_at);
    assert_eq!(b.started_at, old[1].started_at);
    assert_eq!(b.completed_at, None);

    // the original collection is untouched
    assert_eq!(before.get("B").unwrap().status, ExperimentStatus::Pending);
}

#[test]
fn status_merge_for_unknown_id_changes_nothing() {
    let before = ExperimentCollection::new(vec![experiment("A", "alpha")]);
    let update = StatusUpdate {
        id: None,
        status: ExperimentStatus::Failed,
        analysis_status: None,
        completed_at: None,
    };
    let after = before.with_status("Z", &update);
    assert_eq!(after, before);
}

#[test]
fn analysis_rows_follow_map_order() {
    let data: AnalysisData = serde_json::from_value(json!({
        "metrics": {
            "recommendationservice": {"micro_f1_score": 0.5, "micro_precision": 0.25, "micro_recall": 1.0},
            "adservice": {"micro_f1_score": 0.0}
        },
        "probability": {
            "cartservice": {"faultyError": 0.1, "faultyNoError": 0.2, "goodError": 0.3, "goodNoError": 0.4}
        }
    }))
    .unwrap();

    let m = metrics_rows(&data.metrics);
    assert_eq!(m.len(), 2);
    assert_eq!(m[0].service, "recommendationservice");
    assert_eq!(m[0].metrics.micro_precision, Some(0.25));
    assert_eq!(m[1].service, "adservice");
    assert_eq!(m[1].metrics.micro_recall, None);

    let p = probability_rows(&data.probability);
    assert_eq!(
        serde_json::to_value(&p[0]).unwrap(),
        json!({"service": "cartservice", "faultyError": 0.1, "faultyNoError": 0.2, "goodError": 0.3, "goodNoError": 0.4})
    );
}

#[test]
fn empty_analysis_gives_empty_rows() {
    let data: AnalysisData = serde_json::from_str("{}").unwrap();
    assert!(data.metrics_rows().is_empty());
    assert!(data.probability_rows().is_empty());
}
