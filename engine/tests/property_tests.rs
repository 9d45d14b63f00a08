use docket_engine::orchestrator::aggregator::overall_confidence;
use docket_engine::orchestrator::classifier::cue_count;
use docket_engine::orchestrator::metadata::normalize_date;
use docket_engine::orchestrator::{
    CapabilityOutputs, CapabilityResult, Classifier, WorkflowBuilder,
};
use proptest::prelude::*;
use sdk::CapabilityOutput;
use std::collections::HashSet;
use std::time::Duration;

const CUE_WORDS: &[&str] = &[
    "missing record",
    "client worried",
    "precedent",
    "statute",
    "appointment",
    "deposition",
    "exhibit",
    "photo",
    "police report",
    "lorem",
    "ipsum",
    "\n",
];

fn case_text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(CUE_WORDS), 0..12).prop_map(|words| words.join(" "))
}

proptest! {
    #[test]
    fn test_signals_are_well_formed(text in case_text()) {
        let signals = Classifier::default().classify(&text);

        prop_assert!(!signals.is_empty());
        let mut seen = HashSet::new();
        for signal in &signals {
            prop_assert!(seen.insert(signal.task_type));
            prop_assert!((0.0..=1.0).contains(&signal.confidence));
            prop_assert!(signal.match_count <= cue_count(signal.task_type));
        }

        for pair in signals.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(
                a.priority.rank() > b.priority.rank()
                    || (a.priority == b.priority && a.match_count >= b.match_count)
            );
        }
    }

    #[test]
    fn test_workflow_ids_are_unique(text in case_text()) {
        let signals = Classifier::default().classify(&text);
        let workflow = WorkflowBuilder::default().build(&signals);

        let ids: HashSet<&str> = workflow.iter().map(|e| e.capability_id.as_str()).collect();
        prop_assert_eq!(ids.len(), workflow.len());
        prop_assert!(workflow.len() <= signals.len());
    }

    #[test]
    fn test_overall_confidence_in_unit_range(
        scores in prop::collection::vec(prop::option::of(-2.0..3.0f64), 0..8),
        failed in prop::collection::vec(any::<bool>(), 8),
    ) {
        let outputs: CapabilityOutputs = scores
            .iter()
            .enumerate()
            .map(|(i, score)| {
                let id = format!("capability_{}", i);
                let result = if failed[i] {
                    CapabilityResult::unavailable(&id, "timed out", Duration::ZERO)
                } else {
                    let mut output = CapabilityOutput::default();
                    if let Some(score) = score {
                        output = output.with_confidence(*score);
                    }
                    CapabilityResult::success(&id, output, Duration::ZERO)
                };
                (id, result)
            })
            .collect();

        let confidence = overall_confidence(&outputs);
        prop_assert!((0.0..=1.0).contains(&confidence));

        let any_scored = scores
            .iter()
            .zip(&failed)
            .any(|(score, failed)| score.is_some() && !failed);
        if !any_scored {
            prop_assert_eq!(confidence, 0.0);
        }
    }

    #[test]
    fn test_normalized_dates_are_iso(
        year in 1990i32..2030,
        month in 1u32..=12,
        day in 1u32..=28,
    ) {
        let expected = format!("{:04}-{:02}-{:02}", year, month, day);
        let us = format!("{}/{}/{}", month, day, year);

        prop_assert_eq!(normalize_date(&us), Some(expected.clone()));
        prop_assert_eq!(normalize_date(&expected), Some(expected));
    }

    #[test]
    fn test_normalize_date_never_panics(raw in "\\PC{0,24}") {
        if let Some(date) = normalize_date(&raw) {
            prop_assert!(chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_ok());
        }
    }
}
