//! Case triage orchestration
//!
//! A request flows through four stages:
//!
//! 1. [`classifier`] detects task categories in the case text
//! 2. [`workflow`] routes each category to a capability
//! 3. [`dispatcher`] runs the capabilities concurrently under a timeout
//! 4. [`aggregator`] folds the results and [`metadata`] into one report
//!
//! [`pipeline::Orchestrator`] wires the stages together.

pub mod aggregator;
pub mod classifier;
pub mod dispatcher;
pub mod metadata;
pub mod pipeline;
pub mod types;
pub mod workflow;

pub use classifier::{Classifier, FallbackPolicy};
pub use dispatcher::{CapabilityOutputs, Dispatcher};
pub use metadata::{CaseMetadata, MetadataSource, PatternExtractor};
pub use pipeline::{Orchestrator, Plan};
pub use types::{
    AggregateReport, CapabilityResult, CapabilityStatus, OrchestratorError, ReportStatus, Stage,
    TaskSignal, TaskType, WorkflowEntry,
};
pub use workflow::WorkflowBuilder;
