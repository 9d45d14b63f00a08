//! Records Wrangler: missing, incomplete and duplicate records

use super::{confidence_field, object_list, text_field, CapabilityEnv};
use async_trait::async_trait;
use sdk::{Capability, CapabilityError, CapabilityOutput, TaskContext};
use serde_json::{json, Map, Value};

const SYSTEM_PROMPT: &str = "You are an expert legal records analyst specializing in identifying \
missing, incomplete, or duplicate documentation in legal cases.

Your role:
1. Analyze case files to identify what records are present
2. Detect missing or incomplete critical documents (medical reports, police statements, \
insurance approvals, witness statements, etc.)
3. Identify any duplicate records that need reconciliation
4. Assess the urgency and importance of each missing record
5. Provide clear action steps for attorneys to obtain missing records

Always respond in valid JSON.";

const SCHEMA: &str = r#"{
    "missing_records": [
        {"type": "record_type", "description": "detailed description", "urgency": "low|medium|high", "source": "where to obtain this record"}
    ],
    "duplicates": [
        {"type": "record_type", "instances": 2, "description": "description of duplicate"}
    ],
    "recommended_action": "clear step-by-step actions for attorney",
    "confidence_score": 0.0
}"#;

pub struct RecordsWrangler {
    env: CapabilityEnv,
}

impl RecordsWrangler {
    pub fn new(env: CapabilityEnv) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Capability for RecordsWrangler {
    fn id(&self) -> &str {
        "records_wrangler"
    }

    fn description(&self) -> &str {
        "Identifies missing, incomplete, or duplicate records"
    }

    async fn run(
        &self,
        text: &str,
        context: &TaskContext,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let reply = self
            .env
            .ask_json(SYSTEM_PROMPT, SCHEMA, text, context)
            .await?;
        normalise(&reply)
    }
}

fn normalise(reply: &Map<String, Value>) -> Result<CapabilityOutput, CapabilityError> {
    let missing = object_list(
        reply,
        "missing_records",
        &[
            ("type", json!("unknown")),
            ("description", json!("")),
            ("urgency", json!("medium")),
            ("source", json!("unknown")),
        ],
    );
    let duplicates = object_list(
        reply,
        "duplicates",
        &[
            ("type", json!("unknown")),
            ("instances", json!(0)),
            ("description", json!("")),
        ],
    );
    let recommended_action = text_field(reply, "recommended_action");
    let confidence = confidence_field(reply, "confidence_score")?;
    let missing_count = missing.len();

    let mut payload = Map::new();
    payload.insert("missing_records".into(), Value::Array(missing));
    payload.insert("duplicates".into(), Value::Array(duplicates));
    payload.insert("recommended_action".into(), json!(recommended_action));
    payload.insert("confidence_score".into(), json!(confidence.unwrap_or(0.0)));

    let mut output = CapabilityOutput::new(payload).with_action(recommended_action);
    if let Some(confidence) = confidence {
        output = output.with_confidence(confidence);
    }
    if missing_count > 0 {
        output = output
            .with_action(format!("Obtain {} missing record(s)", missing_count))
            .with_headline(format!("{} missing record(s) identified", missing_count));
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::testing::CannedProvider;
    use sdk::Priority;
    use std::sync::Arc;

    #[test]
    fn test_normalise_counts_missing_records() {
        let reply = json!({
            "missing_records": [
                {"type": "medical_report", "description": "MRI results"},
                {"type": "police_report"}
            ],
            "duplicates": "none",
            "recommended_action": "Request MRI results from St. Mary's",
            "confidence_score": 0.85
        });

        let output = normalise(reply.as_object().unwrap()).unwrap();

        assert_eq!(output.confidence, Some(0.85));
        assert_eq!(
            output.actions,
            vec![
                "Request MRI results from St. Mary's".to_string(),
                "Obtain 2 missing record(s)".to_string()
            ]
        );
        assert_eq!(
            output.headline.as_deref(),
            Some("2 missing record(s) identified")
        );
        assert_eq!(output.payload["missing_records"][1]["urgency"], "medium");
        assert_eq!(output.payload["duplicates"], json!([]));
    }

    #[test]
    fn test_no_headline_without_missing_records() {
        let reply = json!({"missing_records": [], "recommended_action": "", "confidence_score": 0.4});
        let output = normalise(reply.as_object().unwrap()).unwrap();
        assert!(output.headline.is_none());
        assert!(output.actions.is_empty());
    }

    #[tokio::test]
    async fn test_run_through_provider() {
        let env = CapabilityEnv::new(Arc::new(CannedProvider(
            "```json\n{\"missing_records\": [{\"type\": \"x\"}], \"confidence_score\": 0.7}\n```"
                .to_string(),
        )));
        let ctx = TaskContext::new("records_analysis", Priority::High, "n/a");

        let output = RecordsWrangler::new(env).run("case", &ctx).await.unwrap();
        assert_eq!(output.confidence, Some(0.7));
        assert_eq!(output.actions, vec!["Obtain 1 missing record(s)".to_string()]);
    }
}
