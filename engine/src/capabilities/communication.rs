//! Communication Guru: client sentiment and message drafting

use super::{text_field, CapabilityEnv};
use async_trait::async_trait;
use sdk::{Capability, CapabilityError, CapabilityOutput, TaskContext};
use serde_json::{json, Map, Value};

const SYSTEM_PROMPT: &str = "You are an expert legal communication specialist with emotional \
intelligence capabilities.

Your role:
1. SENTIMENT ANALYSIS: score the client's emotional state from 0 (calm) to 100 (extremely upset)
2. URGENCY DETECTION: weigh distress, deadlines, unanswered attempts and financial stress
3. COMMUNICATION METHOD: recommend call (score above 70 or urgent), email (routine), or both
4. RESPONSE CONTENT: talking points for a call, or an empathetic email draft

Always respond in valid JSON with all required keys.";

const SCHEMA: &str = r#"{
    "tone": "description of client's emotional state",
    "sentiment_score": 75,
    "urgency_level": "LOW|MEDIUM|HIGH|CRITICAL",
    "recommended_method": "call|email|both",
    "call_recommendation": {
        "should_call": true,
        "urgency": "within_2_hours",
        "reason": "why a call is needed",
        "talking_points": ["point"]
    },
    "message_draft": "complete drafted message",
    "reasoning": "explanation of communication strategy",
    "recommended_action": "optional next step for the attorney"
}"#;

const URGENCY_LEVELS: [&str; 4] = ["LOW", "MEDIUM", "HIGH", "CRITICAL"];
const METHODS: [&str; 3] = ["call", "email", "both"];

pub struct CommunicationGuru {
    env: CapabilityEnv,
}

impl CommunicationGuru {
    pub fn new(env: CapabilityEnv) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Capability for CommunicationGuru {
    fn id(&self) -> &str {
        "communication_guru"
    }

    fn description(&self) -> &str {
        "Drafts empathetic client messages"
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
    let sentiment = match reply.get("sentiment_score") {
        None | Some(Value::Null) => 0,
        Some(value) => value
            .as_f64()
            .filter(|v| v.is_finite())
            .map(|v| v.round().clamp(0.0, 100.0) as u8)
            .ok_or_else(|| {
                CapabilityError::MalformedOutput("sentiment_score is not a number".to_string())
            })?,
    };

    let urgency = text_field(reply, "urgency_level").to_uppercase();
    let urgency = if URGENCY_LEVELS.contains(&urgency.as_str()) {
        urgency
    } else {
        "MEDIUM".to_string()
    };

    let method = text_field(reply, "recommended_method").to_lowercase();
    let method = if METHODS.contains(&method.as_str()) {
        method
    } else {
        "email".to_string()
    };

    let call = reply
        .get("call_recommendation")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_else(|| {
            let mut call = Map::new();
            call.insert("should_call".into(), json!(method != "email"));
            call
        });

    let draft = text_field(reply, "message_draft");
    let recommended_action = text_field(reply, "recommended_action");

    let mut payload = Map::new();
    payload.insert("tone".into(), json!(text_field(reply, "tone")));
    payload.insert("sentiment_score".into(), json!(sentiment));
    payload.insert("urgency_level".into(), json!(urgency));
    payload.insert("recommended_method".into(), json!(method));
    payload.insert("call_recommendation".into(), Value::Object(call));
    payload.insert("message_draft".into(), json!(draft));
    payload.insert("reasoning".into(), json!(text_field(reply, "reasoning")));

    let mut output = CapabilityOutput::new(payload).with_action(recommended_action);
    if !draft.is_empty() {
        output = output.with_action("Send drafted message to client");
    }

    Ok(output)
}
