//! Orchestrator data model
//!
//! Everything here lives for a single request. Field names are serialized in
//! snake_case and form the report contract consumed downstream.

use super::metadata::CaseMetadata;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use sdk::{CapabilityOutput, Priority, TaskContext};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

/// Task categories, in their fixed enumeration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    RecordsAnalysis,
    ClientCommunication,
    LegalResearch,
    Scheduling,
    EvidenceOrganization,
}

impl TaskType {
    pub const ALL: [TaskType; 5] = [
        TaskType::RecordsAnalysis,
        TaskType::ClientCommunication,
        TaskType::LegalResearch,
        TaskType::Scheduling,
        TaskType::EvidenceOrganization,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RecordsAnalysis => "records_analysis",
            Self::ClientCommunication => "client_communication",
            Self::LegalResearch => "legal_research",
            Self::Scheduling => "scheduling",
            Self::EvidenceOrganization => "evidence_organization",
        }
    }

    /// Priority assigned when the category is detected
    pub fn base_priority(self) -> Priority {
        match self {
            Self::RecordsAnalysis | Self::ClientCommunication => Priority::High,
            Self::LegalResearch | Self::Scheduling => Priority::Medium,
            Self::EvidenceOrganization => Priority::Low,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task category detected in the case text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSignal {
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub priority: Priority,
    /// Number of distinct cues that matched
    pub match_count: usize,
    /// match_count over the category's cue count, in [0, 1]
    pub confidence: f64,
}

impl TaskSignal {
    /// Context string handed to the capability
    pub fn describe(&self) -> String {
        format!(
            "Detected from case analysis with {} indicators",
            self.match_count
        )
    }
}

/// One capability invocation planned for the request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEntry {
    pub capability_id: String,
    pub task_signal: TaskSignal,
    pub priority: Priority,
}

impl WorkflowEntry {
    pub fn task_context(&self) -> TaskContext {
        TaskContext::new(
            self.task_signal.task_type.as_str(),
            self.priority,
            self.task_signal.describe(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityStatus {
    Success,
    Unavailable,
}

/// Outcome of one workflow entry
///
/// There is exactly one of these per entry, whatever happened to the
/// capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityResult {
    pub capability_id: String,
    pub status: CapabilityStatus,
    pub payload: Map<String, Value>,
    pub confidence: Option<f64>,
    pub actions: Vec<String>,
    pub headline: Option<String>,
    #[serde(with = "duration_secs")]
    pub execution_time: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CapabilityResult {
    pub fn success(
        capability_id: impl Into<String>,
        output: CapabilityOutput,
        execution_time: Duration,
    ) -> Self {
        Self {
            capability_id: capability_id.into(),
            status: CapabilityStatus::Success,
            payload: output.payload,
            confidence: output.confidence,
            actions: output.actions,
            headline: output.headline,
            execution_time,
            error: None,
        }
    }

    /// A failed entry carries no partial payload
    pub fn unavailable(
        capability_id: impl Into<String>,
        error: impl Into<String>,
        execution_time: Duration,
    ) -> Self {
        Self {
            capability_id: capability_id.into(),
            status: CapabilityStatus::Unavailable,
            payload: Map::new(),
            confidence: None,
            actions: Vec::new(),
            headline: None,
            execution_time,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CapabilityStatus::Success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Completed,
    Failed,
}

/// Terminal artifact of one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub summary: String,
    pub detected_tasks: Vec<TaskSignal>,
    pub capability_outputs: IndexMap<String, CapabilityResult>,
    pub recommended_actions: Vec<String>,
    pub overall_confidence: f64,
    pub capabilities_attempted: usize,
    pub capabilities_successful: usize,
    #[serde(with = "duration_secs")]
    pub elapsed_time: Duration,
    pub context_metadata: CaseMetadata,
    pub timestamp: DateTime<Utc>,
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub const DEGRADED_SUMMARY: &str = "Error processing case file";

impl AggregateReport {
    /// Report returned when a pipeline stage fails
    pub fn degraded(error: impl Into<String>, elapsed_time: Duration) -> Self {
        Self {
            summary: DEGRADED_SUMMARY.to_string(),
            detected_tasks: Vec::new(),
            capability_outputs: IndexMap::new(),
            recommended_actions: Vec::new(),
            overall_confidence: 0.0,
            capabilities_attempted: 0,
            capabilities_successful: 0,
            elapsed_time,
            context_metadata: CaseMetadata::default(),
            timestamp: Utc::now(),
            status: ReportStatus::Failed,
            error: Some(error.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status == ReportStatus::Failed
    }
}

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classify,
    Build,
    Dispatch,
    Aggregate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Classify => "classify",
            Stage::Build => "build",
            Stage::Dispatch => "dispatch",
            Stage::Aggregate => "aggregate",
        };
        f.write_str(name)
    }
}

/// Failures that end a request with a degraded report
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("metadata extraction failed: {0}")]
    Metadata(String),

    #[error("{stage} stage panicked: {message}")]
    StagePanic { stage: Stage, message: String },
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Durations serialized as fractional seconds
pub(crate) mod duration_secs {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
