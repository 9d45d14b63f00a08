//! Legal Researcher: precedents and legal basis

use super::{confidence_field, object_list, text_field, CapabilityEnv};
use async_trait::async_trait;
use sdk::{Capability, CapabilityError, CapabilityOutput, TaskContext};
use serde_json::{json, Map, Value};

const MAX_CASES: usize = 5;

const SYSTEM_PROMPT: &str = "You are an expert legal research assistant specializing in finding \
relevant case law, statutes, and legal precedents.

Your role:
1. Identify the legal issues raised by the case
2. Find precedents that support the client's position, with citations
3. State the primary legal basis for the claim
4. Summarise how the precedents support the argument

Always respond in valid JSON.";

const SCHEMA: &str = r#"{
    "relevant_cases": [
        {"case_name": "Case Name v. Defendant Name", "citation": "Volume Reporter Page (Court Year)", "summary": "holding and key facts", "relevance": "how this supports our argument"}
    ],
    "legal_basis": "primary legal foundation",
    "reasoning_summary": "how the precedents support the legal argument",
    "recommended_action": "optional next research step",
    "confidence_score": 0.0
}"#;

pub struct LegalResearcher {
    env: CapabilityEnv,
}

impl LegalResearcher {
    pub fn new(env: CapabilityEnv) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Capability for LegalResearcher {
    fn id(&self) -> &str {
        "legal_researcher"
    }

    fn description(&self) -> &str {
        "Finds relevant legal precedents"
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
    let mut cases = object_list(
        reply,
        "relevant_cases",
        &[
            ("case_name", json!("Unknown Case")),
            ("citation", json!("Citation not available")),
            ("summary", json!("")),
            ("relevance", json!("")),
        ],
    );
    cases.truncate(MAX_CASES);

    let confidence = confidence_field(reply, "confidence_score")?;

    let mut payload = Map::new();
    payload.insert("relevant_cases".into(), Value::Array(cases));
    payload.insert("legal_basis".into(), json!(text_field(reply, "legal_basis")));
    payload.insert(
        "reasoning_summary".into(),
        json!(text_field(reply, "reasoning_summary")),
    );
    payload.insert("confidence_score".into(), json!(confidence.unwrap_or(0.0)));

    let mut output =
        CapabilityOutput::new(payload).with_action(text_field(reply, "recommended_action"));
    if let Some(confidence) = confidence {
        output = output.with_confidence(confidence);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_caps_case_list() {
        let cases: Vec<_> = (0..8).map(|i| json!({"case_name": format!("Case {}", i)})).collect();
        let reply = json!({
            "relevant_cases": cases,
            "legal_basis": "Negligence under state tort law",
            "confidence_score": 0.82
        });

        let output = normalise(reply.as_object().unwrap()).unwrap();

        let cases = output.payload["relevant_cases"].as_array().unwrap();
        assert_eq!(cases.len(), MAX_CASES);
        assert_eq!(cases[0]["citation"], "Citation not available");
        assert_eq!(output.confidence, Some(0.82));
        assert!(output.actions.is_empty());
    }

    #[test]
    fn test_bad_confidence_is_malformed() {
        let reply = json!({"confidence_score": [0.5]});
        assert!(normalise(reply.as_object().unwrap()).is_err());
    }
}
