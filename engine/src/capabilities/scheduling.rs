//! Voice Bot Scheduler: calls and meetings with clients and witnesses

use super::{confidence_field, text_field, CapabilityEnv};
use async_trait::async_trait;
use sdk::{Capability, CapabilityError, CapabilityOutput, TaskContext};
use serde_json::{json, Map, Value};

const SYSTEM_PROMPT: &str = "You are an expert legal scheduling assistant specializing in \
coordinating communications for law firms.

Your role:
1. Decide who needs to be contacted (client, witness, provider, adjuster)
2. Pick the right channel: call, email, or meeting
3. Suggest a concrete time window
4. Write a professional call script

Always respond in valid JSON.";

const SCHEMA: &str = r#"{
    "action_type": "call|email|meeting",
    "contact_name": "full name of person to contact",
    "contact_number": "+1-XXX-XXX-XXXX",
    "contact_email": "email@example.com or empty string",
    "suggested_time": "specific time window",
    "call_script": "complete professional call script",
    "reasoning": "explanation for this recommendation",
    "recommended_action": "optional next step for the attorney",
    "confidence_score": 0.0
}"#;

const ACTION_TYPES: [&str; 3] = ["call", "email", "meeting"];

pub struct VoiceBotScheduler {
    env: CapabilityEnv,
}

impl VoiceBotScheduler {
    pub fn new(env: CapabilityEnv) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Capability for VoiceBotScheduler {
    fn id(&self) -> &str {
        "voice_bot_scheduler"
    }

    fn description(&self) -> &str {
        "Coordinates calls and meetings"
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
    let action_type = text_field(reply, "action_type").to_lowercase();
    let action_type = if ACTION_TYPES.contains(&action_type.as_str()) {
        action_type
    } else {
        "call".to_string()
    };

    let contact_name = text_field(reply, "contact_name");
    let call_script = text_field(reply, "call_script");
    let confidence = confidence_field(reply, "confidence_score")?;

    let mut payload = Map::new();
    payload.insert("action_type".into(), json!(action_type));
    payload.insert("contact_name".into(), json!(contact_name));
    payload.insert(
        "contact_number".into(),
        json!(text_field(reply, "contact_number")),
    );
    payload.insert(
        "contact_email".into(),
        json!(text_field(reply, "contact_email")),
    );
    payload.insert(
        "suggested_time".into(),
        json!(text_field(reply, "suggested_time")),
    );
    payload.insert("call_script".into(), json!(call_script));
    payload.insert("reasoning".into(), json!(text_field(reply, "reasoning")));
    payload.insert("confidence_score".into(), json!(confidence.unwrap_or(0.0)));

    let mut output =
        CapabilityOutput::new(payload).with_action(text_field(reply, "recommended_action"));
    if let Some(confidence) = confidence {
        output = output.with_confidence(confidence);
    }
    if !call_script.is_empty() {
        let contact = if contact_name.is_empty() {
            "contact"
        } else {
            contact_name.as_str()
        };
        output = output.with_action(format!("Schedule call with {}", contact));
    }

    Ok(output)
}
