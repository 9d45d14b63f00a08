//! Evidence Sorter: classification and gap detection

use super::{confidence_field, object_list, text_field, CapabilityEnv};
use async_trait::async_trait;
use sdk::{clamp_unit, Capability, CapabilityError, CapabilityOutput, TaskContext};
use serde_json::{json, Map, Value};

const SYSTEM_PROMPT: &str = "You are an expert legal evidence analyst specializing in document \
classification, metadata extraction, and evidence organization.

Your role:
1. Classify each piece of evidence (medical, police, photographic, financial, correspondence, witness)
2. Extract its date and source, and rate its relevance from 0.0 to 1.0
3. Flag evidence that is referenced but not attached
4. Recommend how to organise the evidence for the case

Always respond in valid JSON.";

const SCHEMA: &str = r#"{
    "evidence_summary": [
        {"type": "category name", "description": "detailed description", "date": "YYYY-MM-DD or 'unknown'", "source": "author or source", "relevance_score": 0.0, "authenticity_status": "verified|unverified|questionable|pending"}
    ],
    "missing_evidence": [
        {"type": "category name", "description": "description of missing evidence", "referenced_in": "where it was mentioned"}
    ],
    "recommended_action": "organization strategy and next steps",
    "confidence_score": 0.0
}"#;

pub struct EvidenceSorter {
    env: CapabilityEnv,
}

impl EvidenceSorter {
    pub fn new(env: CapabilityEnv) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Capability for EvidenceSorter {
    fn id(&self) -> &str {
        "evidence_sorter"
    }

    fn description(&self) -> &str {
        "Classifies and organizes evidence"
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
    let mut evidence = object_list(
        reply,
        "evidence_summary",
        &[
            ("type", json!("unclassified")),
            ("description", json!("")),
            ("date", json!("unknown")),
            ("source", json!("unknown")),
            ("relevance_score", json!(0.0)),
            ("authenticity_status", json!("pending")),
        ],
    );
    for item in &mut evidence {
        if let Some(score) = item.get_mut("relevance_score") {
            let value = score.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0);
            *score = json!(clamp_unit(value));
        }
    }

    let missing = object_list(
        reply,
        "missing_evidence",
        &[
            ("type", json!("unknown")),
            ("description", json!("")),
            ("referenced_in", json!("")),
        ],
    );
    let recommended_action = text_field(reply, "recommended_action");
    let confidence = confidence_field(reply, "confidence_score")?;
    let evidence_count = evidence.len();

    let mut payload = Map::new();
    payload.insert("evidence_summary".into(), Value::Array(evidence));
    payload.insert("missing_evidence".into(), Value::Array(missing));
    payload.insert("recommended_action".into(), json!(recommended_action));
    payload.insert("confidence_score".into(), json!(confidence.unwrap_or(0.0)));

    let mut output = CapabilityOutput::new(payload).with_action(recommended_action);
    if let Some(confidence) = confidence {
        output = output.with_confidence(confidence);
    }
    if evidence_count > 0 {
        output = output.with_headline(format!(
            "{} piece(s) of evidence classified",
            evidence_count
        ));
    }

    Ok(output)
}
