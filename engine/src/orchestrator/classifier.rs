//! Task classifier
//!
//! Tests every task category against its own cue set and emits one
//! [`TaskSignal`] per category that matched at least once. Categories are
//! scored independently; one never affects another.

use super::types::{TaskSignal, TaskType};
use regex::Regex;
use sdk::{clamp_unit, Priority};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// What to return when no category matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Records analysis at medium plus evidence organisation at low
    #[default]
    DefaultPair,

    /// Return no signals; the workflow will be empty
    #[serde(rename = "none")]
    Disabled,
}

impl FallbackPolicy {
    pub fn signals(self) -> Vec<TaskSignal> {
        match self {
            FallbackPolicy::DefaultPair => vec![
                fallback_signal(TaskType::RecordsAnalysis, Priority::Medium),
                fallback_signal(TaskType::EvidenceOrganization, Priority::Low),
            ],
            FallbackPolicy::Disabled => Vec::new(),
        }
    }
}

const FALLBACK_CONFIDENCE: f64 = 0.5;

fn fallback_signal(task_type: TaskType, priority: Priority) -> TaskSignal {
    TaskSignal {
        task_type,
        priority,
        match_count: 0,
        confidence: FALLBACK_CONFIDENCE,
    }
}

/// Cue patterns per category, in enumeration order
const CUES: [(TaskType, &[&str]); 5] = [
    (
        TaskType::RecordsAnalysis,
        &[
            r"missing.*record",
            r"incomplete.*record",
            r"duplicate.*record",
            r"need.*record",
            r"awaiting.*record",
            r"not.*received",
            r"outstanding.*record",
            r"pending.*record",
        ],
    ),
    (
        TaskType::ClientCommunication,
        &[
            r"client.*anxious",
            r"client.*worried",
            r"client.*called",
            r"client.*concerned",
            r"reassure.*client",
            r"update.*client",
            r"client.*follow.?up",
            r"client.*needs",
        ],
    ),
    (
        TaskType::LegalResearch,
        &[
            r"legal.*issue",
            r"precedent",
            r"case.*law",
            r"statute",
            r"legal.*research",
            r"legal.*question",
            r"jurisdiction",
            r"verdict",
            r"ruling",
            r"legal.*basis",
        ],
    ),
    (
        TaskType::Scheduling,
        &[
            r"schedule.*call",
            r"schedule.*meeting",
            r"contact.*witness",
            r"call.*needed",
            r"follow.?up.*call",
            r"appointment",
            r"deposition",
            r"interview.*witness",
            r"phone.*number",
        ],
    ),
    (
        TaskType::EvidenceOrganization,
        &[
            r"evidence",
            r"exhibit",
            r"document.*inventory",
            r"photo",
            r"medical.*bill",
            r"police.*report",
            r"witness.*statement",
            r"classify.*document",
            r"organize.*evidence",
        ],
    ),
];

struct CueSet {
    task_type: TaskType,
    cues: Vec<Regex>,
}

static CUE_SETS: OnceLock<Vec<CueSet>> = OnceLock::new();

fn cue_sets() -> &'static [CueSet] {
    CUE_SETS.get_or_init(|| {
        CUES.iter()
            .map(|(task_type, patterns)| CueSet {
                task_type: *task_type,
                cues: patterns
                    .iter()
                    .map(|p| Regex::new(&format!("(?i){}", p)).expect("Invalid cue pattern"))
                    .collect(),
            })
            .collect()
    })
}

/// Number of cues defined for a category
pub fn cue_count(task_type: TaskType) -> usize {
    cue_sets()
        .iter()
        .find(|set| set.task_type == task_type)
        .map_or(0, |set| set.cues.len())
}

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    fallback: FallbackPolicy,
}

impl Classifier {
    pub fn new(fallback: FallbackPolicy) -> Self {
        Self { fallback }
    }

    /// Detect task categories in `text`
    ///
    /// Output is sorted by priority rank, then match count, both descending.
    /// The sort is stable, so equal keys keep enumeration order.
    pub fn classify(&self, text: &str) -> Vec<TaskSignal> {
        let mut signals: Vec<TaskSignal> = cue_sets()
            .iter()
            .filter_map(|set| {
                let match_count = set.cues.iter().filter(|cue| cue.is_match(text)).count();
                if match_count == 0 {
                    return None;
                }

                let task_type = set.task_type;
                tracing::debug!(
                    task_type = %task_type,
                    match_count,
                    cues = set.cues.len(),
                    "Category matched"
                );

                Some(TaskSignal {
                    task_type,
                    priority: task_type.base_priority(),
                    match_count,
                    confidence: clamp_unit(match_count as f64 / set.cues.len() as f64),
                })
            })
            .collect();

        if signals.is_empty() {
            tracing::warn!(policy = ?self.fallback, "No task category matched, applying fallback");
            return self.fallback.signals();
        }

        sort_signals(&mut signals);
        signals
    }
}

/// Stable sort by (priority rank desc, match_count desc)
pub fn sort_signals(signals: &mut [TaskSignal]) {
    signals.sort_by(|a, b| {
        b.priority
            .rank()
            .cmp(&a.priority.rank())
            .then(b.match_count.cmp(&a.match_count))
    });
}
