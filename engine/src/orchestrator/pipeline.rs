//! Request pipeline
//!
//! Classify, build the workflow, dispatch, then aggregate. Capability failures
//! are absorbed by the dispatcher; a failure of any stage itself ends the
//! request with [`AggregateReport::degraded`] instead of an error.

use super::aggregator;
use super::classifier::Classifier;
use super::dispatcher::Dispatcher;
use super::metadata::{MetadataSource, PatternExtractor};
use super::types::{panic_message, AggregateReport, OrchestratorError, Stage, TaskSignal, WorkflowEntry};
use super::workflow::WorkflowBuilder;
use crate::capabilities::CapabilityRegistry;
use crate::config::Config;
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Classification and routing for a case, without running any capability
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub detected_tasks: Vec<TaskSignal>,
    pub workflow: Vec<WorkflowEntry>,
}

pub struct Orchestrator {
    classifier: Classifier,
    workflow: WorkflowBuilder,
    dispatcher: Dispatcher,
    metadata: Arc<dyn MetadataSource>,
}

impl Orchestrator {
    pub fn new(classifier: Classifier, workflow: WorkflowBuilder, dispatcher: Dispatcher) -> Self {
        Self {
            classifier,
            workflow,
            dispatcher,
            metadata: Arc::new(PatternExtractor),
        }
    }

    /// Standard routing with classifier and timeout settings from config
    pub fn from_config(config: &Config, registry: CapabilityRegistry) -> Self {
        Self::new(
            Classifier::new(config.classifier.fallback),
            WorkflowBuilder::default(),
            Dispatcher::new(Arc::new(registry), config.dispatch.capability_timeout()),
        )
    }

    pub fn with_metadata_source(mut self, source: Arc<dyn MetadataSource>) -> Self {
        self.metadata = source;
        self
    }

    /// Run the classify and build stages only
    pub fn plan(&self, text: &str) -> Result<Plan, OrchestratorError> {
        let detected_tasks = run_stage(Stage::Classify, || Ok(self.classifier.classify(text)))?;
        let workflow = run_stage(Stage::Build, || Ok(self.workflow.build(&detected_tasks)))?;
        Ok(Plan {
            detected_tasks,
            workflow,
        })
    }

    /// Process one case file end to end
    ///
    /// Never fails: a stage error or panic yields a degraded report carrying
    /// the error text. Requests share no state, so calls may run concurrently.
    pub async fn process_case(&self, text: &str) -> AggregateReport {
        let started = Instant::now();

        match self.run(text, started).await {
            Ok(report) => {
                tracing::info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    successful = report.capabilities_successful,
                    attempted = report.capabilities_attempted,
                    "Case processed"
                );
                report
            }
            Err(e) => {
                tracing::error!(error = %e, "Case processing failed");
                AggregateReport::degraded(e.to_string(), started.elapsed())
            }
        }
    }

    async fn run(&self, text: &str, started: Instant) -> Result<AggregateReport, OrchestratorError> {
        tracing::info!(chars = text.chars().count(), "Processing case file");

        let Plan {
            detected_tasks,
            workflow,
        } = self.plan(text)?;
        tracing::info!(
            stage = %Stage::Dispatch,
            tasks = detected_tasks.len(),
            entries = workflow.len(),
            timeout_secs = self.dispatcher.timeout().as_secs(),
            "Dispatching workflow"
        );

        let outputs = self.dispatcher.dispatch(Arc::from(text), &workflow).await;

        run_stage(Stage::Aggregate, move || {
            let metadata = self.metadata.extract(text)?;
            Ok(aggregator::aggregate(
                detected_tasks,
                outputs,
                metadata,
                started.elapsed(),
            ))
        })
    }
}

/// Run a synchronous stage, turning a panic into [`OrchestratorError::StagePanic`]
fn run_stage<T>(
    stage: Stage,
    f: impl FnOnce() -> Result<T, OrchestratorError>,
) -> Result<T, OrchestratorError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(panic) => Err(OrchestratorError::StagePanic {
            stage,
            message: panic_message(panic.as_ref()),
        }),
    }
}
