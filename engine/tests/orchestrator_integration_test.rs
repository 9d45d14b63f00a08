//! Integration tests for the case triage pipeline
//!
//! Capabilities here are in-process fakes, so no provider is contacted.

use async_trait::async_trait;
use docket_engine::capabilities::CapabilityRegistry;
use docket_engine::orchestrator::dispatcher::{ERR_NOT_REGISTERED, ERR_TIMED_OUT};
use docket_engine::orchestrator::{
    CapabilityStatus, CaseMetadata, Classifier, Dispatcher, FallbackPolicy, MetadataSource,
    Orchestrator, OrchestratorError, ReportStatus, TaskType, WorkflowBuilder,
};
use sdk::{Capability, CapabilityError, CapabilityOutput, Priority, TaskContext};
use std::sync::Arc;
use std::time::Duration;

const INTAKE: &str = "Client: John Smith. Case #2024-PI-1234. Case Type: Personal Injury. \
                      Client is anxious and called twice about missing MRI records.";

const EVERY_CATEGORY: &str = "missing record; client worried; precedent; appointment; exhibit";

#[derive(Clone)]
enum Behaviour {
    Succeed(f64),
    Unchecked(f64),
    Fail,
    Stall,
    Panic,
}

struct Fake {
    id: &'static str,
    behaviour: Behaviour,
}

impl Fake {
    fn new(id: &'static str, behaviour: Behaviour) -> Arc<dyn Capability> {
        Arc::new(Self { id, behaviour })
    }
}

#[async_trait]
impl Capability for Fake {
    fn id(&self) -> &str {
        self.id
    }

    fn description(&self) -> &str {
        "fake"
    }

    async fn run(
        &self,
        _text: &str,
        context: &TaskContext,
    ) -> Result<CapabilityOutput, CapabilityError> {
        match self.behaviour {
            Behaviour::Succeed(confidence) => Ok(CapabilityOutput::default()
                .with_confidence(confidence)
                .with_action(format!("follow up on {}", context.task_type))
                .with_headline(format!("{} reviewed", context.task_type))),
            Behaviour::Unchecked(confidence) => Ok(CapabilityOutput {
                confidence: Some(confidence),
                ..CapabilityOutput::default()
            }),
            Behaviour::Fail => Err(CapabilityError::Provider("quota exhausted".into())),
            Behaviour::Stall => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(CapabilityOutput::default())
            }
            Behaviour::Panic => panic!("fake capability exploded"),
        }
    }
}

struct ExplodingExtractor;

impl MetadataSource for ExplodingExtractor {
    fn extract(&self, _text: &str) -> Result<CaseMetadata, OrchestratorError> {
        panic!("extractor blew up")
    }
}

fn orchestrator(capabilities: Vec<Arc<dyn Capability>>, timeout: Duration) -> Orchestrator {
    let mut registry = CapabilityRegistry::new();
    for capability in capabilities {
        registry.register(capability).unwrap();
    }
    Orchestrator::new(
        Classifier::default(),
        WorkflowBuilder::default(),
        Dispatcher::new(Arc::new(registry), timeout),
    )
}

#[tokio::test]
async fn test_intake_note_end_to_end() {
    let orchestrator = orchestrator(
        vec![
            Fake::new("records_wrangler", Behaviour::Succeed(0.8)),
            Fake::new("communication_guru", Behaviour::Succeed(0.6)),
        ],
        Duration::from_secs(5),
    );

    let report = orchestrator.process_case(INTAKE).await;

    assert_eq!(report.status, ReportStatus::Completed);
    let types: Vec<TaskType> = report.detected_tasks.iter().map(|s| s.task_type).collect();
    assert_eq!(
        types,
        vec![TaskType::ClientCommunication, TaskType::RecordsAnalysis]
    );
    assert!(report
        .detected_tasks
        .iter()
        .all(|s| s.priority == Priority::High));

    let keys: Vec<&str> = report.capability_outputs.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["communication_guru", "records_wrangler"]);
    assert_eq!(report.overall_confidence, 0.7);
    assert_eq!(report.capabilities_successful, 2);

    assert_eq!(
        report.recommended_actions,
        vec![
            "[communication_guru] follow up on client_communication",
            "[records_wrangler] follow up on records_analysis",
        ]
    );
    assert_eq!(
        report.summary,
        "Case #2024-PI-1234 | Type: Personal Injury | Detected 2 actionable task(s) | \
         Analyzed by 2 of 2 capabilities | client_communication reviewed | records_analysis reviewed"
    );
    assert_eq!(
        report.context_metadata.client_name.as_ref().map(|f| f.value.as_str()),
        Some("John Smith")
    );
}

#[tokio::test]
async fn test_out_of_range_confidence_is_clamped_before_aggregation() {
    let orchestrator = orchestrator(
        vec![
            Fake::new("records_wrangler", Behaviour::Unchecked(1.7)),
            Fake::new("communication_guru", Behaviour::Unchecked(0.1)),
        ],
        Duration::from_secs(5),
    );

    let report = orchestrator.process_case(INTAKE).await;

    assert_eq!(report.capability_outputs["records_wrangler"].confidence, Some(1.0));
    assert_eq!(report.capability_outputs["communication_guru"].confidence, Some(0.1));
    assert_eq!(report.overall_confidence, 0.55);
}

#[tokio::test]
async fn test_every_result_unavailable_still_reports() {
    // Nothing registered: every entry is unavailable
    let orchestrator = orchestrator(Vec::new(), Duration::from_secs(5));

    let report = orchestrator.process_case(EVERY_CATEGORY).await;

    assert_eq!(report.status, ReportStatus::Completed);
    assert_eq!(report.detected_tasks.len(), 5);
    let keys: Vec<&str> = report.capability_outputs.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "records_wrangler",
            "communication_guru",
            "legal_researcher",
            "voice_bot_scheduler",
            "evidence_sorter",
        ]
    );
    assert!(report.capability_outputs.values().all(|r| {
        r.status == CapabilityStatus::Unavailable && r.error.as_deref() == Some(ERR_NOT_REGISTERED)
    }));
    assert_eq!(report.overall_confidence, 0.0);
    assert_eq!(report.capabilities_successful, 0);
    assert!(report.recommended_actions.is_empty());
    assert!(report.summary.contains("Analyzed by 0 of 5 capabilities"));
}

#[tokio::test(start_paused = true)]
async fn test_stalled_capability_times_out_alone() {
    let orchestrator = orchestrator(
        vec![
            Fake::new("records_wrangler", Behaviour::Stall),
            Fake::new("communication_guru", Behaviour::Succeed(0.9)),
        ],
        Duration::from_secs(2),
    );

    let report = orchestrator.process_case(INTAKE).await;

    let stalled = &report.capability_outputs["records_wrangler"];
    assert_eq!(stalled.status, CapabilityStatus::Unavailable);
    assert_eq!(stalled.error.as_deref(), Some(ERR_TIMED_OUT));
    assert!(stalled.payload.is_empty());

    let healthy = &report.capability_outputs["communication_guru"];
    assert!(healthy.is_success());
    assert_eq!(report.overall_confidence, 0.9);
}

#[tokio::test]
async fn test_failures_and_panics_are_isolated() {
    let orchestrator = orchestrator(
        vec![
            Fake::new("records_wrangler", Behaviour::Panic),
            Fake::new("communication_guru", Behaviour::Fail),
            Fake::new("legal_researcher", Behaviour::Succeed(0.4)),
            Fake::new("voice_bot_scheduler", Behaviour::Succeed(0.6)),
            Fake::new("evidence_sorter", Behaviour::Succeed(1.0)),
        ],
        Duration::from_secs(5),
    );

    let report = orchestrator.process_case(EVERY_CATEGORY).await;

    assert_eq!(report.status, ReportStatus::Completed);
    assert_eq!(report.capabilities_attempted, 5);
    assert_eq!(report.capabilities_successful, 3);

    let panicked = &report.capability_outputs["records_wrangler"];
    assert!(!panicked.is_success());
    assert!(panicked
        .error
        .as_deref()
        .unwrap()
        .contains("fake capability exploded"));

    let failed = &report.capability_outputs["communication_guru"];
    assert_eq!(
        failed.error.as_deref(),
        Some("provider error: quota exhausted")
    );

    // (0.4 + 0.6 + 1.0) / 3 rounded
    assert_eq!(report.overall_confidence, 0.67);
    assert_eq!(report.recommended_actions.len(), 3);
}

#[tokio::test]
async fn test_metadata_panic_yields_degraded_report() {
    let orchestrator = orchestrator(
        vec![Fake::new("records_wrangler", Behaviour::Succeed(0.8))],
        Duration::from_secs(5),
    )
    .with_metadata_source(Arc::new(ExplodingExtractor));

    let report = orchestrator.process_case(INTAKE).await;

    assert!(report.is_degraded());
    assert_eq!(report.summary, "Error processing case file");
    assert!(report.detected_tasks.is_empty());
    assert!(report.capability_outputs.is_empty());
    assert!(report.recommended_actions.is_empty());
    assert_eq!(report.overall_confidence, 0.0);
    assert_eq!(
        report.error.as_deref(),
        Some("aggregate stage panicked: extractor blew up")
    );

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "failed");
}

#[tokio::test]
async fn test_disabled_fallback_produces_empty_workflow() {
    let mut registry = CapabilityRegistry::new();
    registry
        .register(Fake::new("records_wrangler", Behaviour::Succeed(0.8)))
        .unwrap();
    let orchestrator = Orchestrator::new(
        Classifier::new(FallbackPolicy::Disabled),
        WorkflowBuilder::default(),
        Dispatcher::new(Arc::new(registry), Duration::from_secs(5)),
    );

    let report = orchestrator.process_case("Lorem ipsum dolor sit amet.").await;

    assert_eq!(report.status, ReportStatus::Completed);
    assert!(report.detected_tasks.is_empty());
    assert!(report.capability_outputs.is_empty());
    assert_eq!(report.overall_confidence, 0.0);
}

#[tokio::test]
async fn test_repeated_requests_are_consistent() {
    let orchestrator = orchestrator(
        vec![
            Fake::new("records_wrangler", Behaviour::Succeed(0.8)),
            Fake::new("communication_guru", Behaviour::Fail),
        ],
        Duration::from_secs(5),
    );

    let (first, second) = futures::join!(
        orchestrator.process_case(INTAKE),
        orchestrator.process_case(INTAKE)
    );

    assert_eq!(first.detected_tasks, second.detected_tasks);
    assert_eq!(
        first.capability_outputs.keys().collect::<Vec<_>>(),
        second.capability_outputs.keys().collect::<Vec<_>>()
    );
    assert_eq!(first.summary, second.summary);
    assert_eq!(first.recommended_actions, second.recommended_actions);
}

#[tokio::test]
async fn test_report_json_shape() {
    let orchestrator = orchestrator(
        vec![Fake::new("records_wrangler", Behaviour::Succeed(0.8))],
        Duration::from_secs(5),
    );

    let report = orchestrator.process_case(INTAKE).await;
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["status"], "completed");
    assert!(json.get("error").is_none());
    assert_eq!(json["detected_tasks"][0]["type"], "client_communication");
    assert_eq!(json["detected_tasks"][0]["priority"], "high");
    assert_eq!(
        json["capability_outputs"]["communication_guru"]["status"],
        "unavailable"
    );
    assert_eq!(
        json["capability_outputs"]["records_wrangler"]["status"],
        "success"
    );
    let records = &json["capability_outputs"]["records_wrangler"];
    assert_eq!(records["capability_id"], "records_wrangler");
    assert!(records["execution_time"].is_number());
    assert!(records["payload"].as_object().unwrap().is_empty());
    assert!(json["elapsed_time"].is_number());
    assert_eq!(
        json["context_metadata"]["case_number"]["value"],
        "2024-PI-1234"
    );
}
