//! Result aggregator
//!
//! Folds the capability results of one request into an [`AggregateReport`].
//! Only successful results contribute confidence, actions and headlines; the
//! aggregator never looks at which capability produced them.

use super::dispatcher::CapabilityOutputs;
use super::metadata::CaseMetadata;
use super::types::{AggregateReport, ReportStatus, TaskSignal};
use chrono::Utc;
use sdk::clamp_unit;
use std::time::Duration;

const MAX_HEADLINES: usize = 2;
const UNKNOWN: &str = "Unknown";

/// Build the report for a completed request
pub fn aggregate(
    detected_tasks: Vec<TaskSignal>,
    capability_outputs: CapabilityOutputs,
    context_metadata: CaseMetadata,
    elapsed_time: Duration,
) -> AggregateReport {
    let capabilities_attempted = capability_outputs.len();
    let capabilities_successful = capability_outputs
        .values()
        .filter(|r| r.is_success())
        .count();

    let summary = summarize(
        &context_metadata,
        detected_tasks.len(),
        &capability_outputs,
    );
    let recommended_actions = collect_actions(&capability_outputs);
    let overall_confidence = overall_confidence(&capability_outputs);

    tracing::info!(
        attempted = capabilities_attempted,
        successful = capabilities_successful,
        actions = recommended_actions.len(),
        overall_confidence,
        "Aggregated capability results"
    );

    AggregateReport {
        summary,
        detected_tasks,
        capability_outputs,
        recommended_actions,
        overall_confidence,
        capabilities_attempted,
        capabilities_successful,
        elapsed_time,
        context_metadata,
        timestamp: Utc::now(),
        status: ReportStatus::Completed,
        error: None,
    }
}

/// Mean of every confidence reported by a successful capability
///
/// Rounded to two decimals and clamped to [0, 1]; 0.0 when there is none.
pub fn overall_confidence(outputs: &CapabilityOutputs) -> f64 {
    let scores: Vec<f64> = outputs
        .values()
        .filter(|r| r.is_success())
        .filter_map(|r| r.confidence)
        .filter(|c| c.is_finite())
        .collect();

    if scores.is_empty() {
        return 0.0;
    }

    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    clamp_unit((mean * 100.0).round() / 100.0)
}

/// Every successful capability's actions, tagged with its id, in workflow order
pub fn collect_actions(outputs: &CapabilityOutputs) -> Vec<String> {
    outputs
        .values()
        .filter(|r| r.is_success())
        .flat_map(|r| {
            r.actions
                .iter()
                .map(move |action| format!("[{}] {}", r.capability_id, action))
        })
        .collect()
}

/// One-line summary joined with " | "
pub fn summarize(
    metadata: &CaseMetadata,
    task_count: usize,
    outputs: &CapabilityOutputs,
) -> String {
    let successful = outputs.values().filter(|r| r.is_success()).count();

    let mut parts = vec![
        format!("Case #{}", metadata.case_number().unwrap_or(UNKNOWN)),
        format!("Type: {}", metadata.case_type().unwrap_or(UNKNOWN)),
        format!("Detected {} actionable task(s)", task_count),
        format!("Analyzed by {} of {} capabilities", successful, outputs.len()),
    ];

    parts.extend(
        outputs
            .values()
            .filter(|r| r.is_success())
            .filter_map(|r| r.headline.as_deref())
            .filter(|h| !h.trim().is_empty())
            .take(MAX_HEADLINES)
            .map(str::to_string),
    );

    parts.join(" | ")
}
