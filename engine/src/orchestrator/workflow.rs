//! Workflow builder
//!
//! Maps task signals to capability ids through a static route table and
//! removes duplicate capabilities, keeping the first (highest priority)
//! occurrence.

use super::types::{TaskSignal, TaskType, WorkflowEntry};
use std::collections::{HashMap, HashSet};

/// Default routes from task category to capability id
pub const STANDARD_ROUTES: [(TaskType, &str); 5] = [
    (TaskType::RecordsAnalysis, "records_wrangler"),
    (TaskType::ClientCommunication, "communication_guru"),
    (TaskType::LegalResearch, "legal_researcher"),
    (TaskType::Scheduling, "voice_bot_scheduler"),
    (TaskType::EvidenceOrganization, "evidence_sorter"),
];

#[derive(Debug, Clone)]
pub struct WorkflowBuilder {
    routes: HashMap<TaskType, String>,
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self::with_routes(STANDARD_ROUTES)
    }
}

impl WorkflowBuilder {
    /// Builder with a custom route table
    ///
    /// Task types missing from the table are dropped when building.
    pub fn with_routes<I, S>(routes: I) -> Self
    where
        I: IntoIterator<Item = (TaskType, S)>,
        S: Into<String>,
    {
        Self {
            routes: routes
                .into_iter()
                .map(|(task_type, id)| (task_type, id.into()))
                .collect(),
        }
    }

    pub fn route(&self, task_type: TaskType) -> Option<&str> {
        self.routes.get(&task_type).map(String::as_str)
    }

    /// Build the workflow from priority-sorted signals
    pub fn build(&self, signals: &[TaskSignal]) -> Vec<WorkflowEntry> {
        let mut seen = HashSet::new();
        let mut workflow = Vec::with_capacity(signals.len());

        for signal in signals {
            let Some(capability_id) = self.route(signal.task_type) else {
                tracing::debug!(task_type = %signal.task_type, "No route for task type, dropping");
                continue;
            };

            if !seen.insert(capability_id) {
                continue;
            }

            workflow.push(WorkflowEntry {
                capability_id: capability_id.to_string(),
                task_signal: signal.clone(),
                priority: signal.priority,
            });
        }

        workflow
    }
}
