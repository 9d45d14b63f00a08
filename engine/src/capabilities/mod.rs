//! Reference capabilities
//!
//! Five capabilities ship with the engine, one per task category. Each sends
//! a system prompt plus the case text to the shared text-generation provider,
//! pulls a JSON object out of the reply, normalises it, and returns the
//! common [`CapabilityOutput`] shape.
//!
//! Capabilities are stored in a [`CapabilityRegistry`] keyed by id. The
//! dispatcher looks them up there; ids it cannot find become `unavailable`
//! results rather than errors.

use crate::llm::{LLMError, LLMProvider, Message};
use indexmap::IndexMap;
use sdk::errors::EngineError;
use sdk::{clamp_unit, Capability, CapabilityError, TaskContext};
use serde_json::{Map, Value};
use std::sync::Arc;

pub mod communication;
pub mod evidence;
pub mod records;
pub mod research;
pub mod scheduling;

pub use communication::CommunicationGuru;
pub use evidence::EvidenceSorter;
pub use records::RecordsWrangler;
pub use research::LegalResearcher;
pub use scheduling::VoiceBotScheduler;

/// Process-wide environment handed to every capability
///
/// Built once at startup; tests swap in a fake provider.
#[derive(Clone)]
pub struct CapabilityEnv {
    pub provider: Arc<dyn LLMProvider>,
}

impl CapabilityEnv {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }

    /// Ask the provider for a JSON object describing `text`
    ///
    /// `schema` is appended to the user turn so the model knows the exact
    /// keys to produce.
    pub async fn ask_json(
        &self,
        system_prompt: &str,
        schema: &str,
        text: &str,
        context: &TaskContext,
    ) -> Result<Map<String, Value>, CapabilityError> {
        let task = serde_json::to_string_pretty(context)
            .map_err(|e| CapabilityError::Failed(format!("cannot encode task context: {}", e)))?;

        let user_prompt = format!(
            "Case Documentation:\n{}\n\nTask Details:\n{}\n\nRespond ONLY with valid JSON in this exact format:\n{}",
            text, task, schema
        );

        let messages = [Message::system(system_prompt), Message::user(user_prompt)];

        let response = self
            .provider
            .generate(&messages)
            .await
            .map_err(provider_error)?;

        response.json_object().ok_or_else(|| {
            CapabilityError::MalformedOutput(format!(
                "{} reply did not contain a JSON object",
                self.provider.name()
            ))
        })
    }
}

fn provider_error(err: LLMError) -> CapabilityError {
    CapabilityError::Provider(err.to_string())
}

/// Registry of capabilities, keyed by id in registration order
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    capabilities: IndexMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the five reference capabilities
    pub fn standard(env: CapabilityEnv) -> Self {
        let mut registry = Self::new();
        let builtins: [Arc<dyn Capability>; 5] = [
            Arc::new(RecordsWrangler::new(env.clone())),
            Arc::new(CommunicationGuru::new(env.clone())),
            Arc::new(LegalResearcher::new(env.clone())),
            Arc::new(VoiceBotScheduler::new(env.clone())),
            Arc::new(EvidenceSorter::new(env)),
        ];
        for capability in builtins {
            let id = capability.id().to_string();
            registry.capabilities.insert(id, capability);
        }
        registry
    }

    /// Register a capability
    ///
    /// # Errors
    /// Returns `EngineError::DuplicateCapability` if the id is taken.
    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Result<(), EngineError> {
        let id = capability.id().to_string();
        if self.contains(&id) {
            return Err(EngineError::DuplicateCapability(id));
        }
        tracing::debug!("Registered capability '{}'", id);
        self.capabilities.insert(id, capability);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.capabilities.contains_key(id)
    }

    /// Registered capabilities in registration order
    pub fn list(&self) -> impl Iterator<Item = &Arc<dyn Capability>> {
        self.capabilities.values()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

// Reply normalisation helpers shared by the reference capabilities.

/// Read a string field, trimmed; anything else becomes empty
pub(crate) fn text_field(reply: &Map<String, Value>, key: &str) -> String {
    reply
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Read a list of objects, filling in missing keys with defaults
///
/// Non-list values become an empty list; non-object items are dropped.
pub(crate) fn object_list(
    reply: &Map<String, Value>,
    key: &str,
    defaults: &[(&str, Value)],
) -> Vec<Value> {
    let Some(items) = reply.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .map(|item| {
            let mut item = item.clone();
            for (field, default) in defaults {
                item.entry(field.to_string())
                    .or_insert_with(|| default.clone());
            }
            Value::Object(item)
        })
        .collect()
}

/// Read a confidence field
///
/// Absent or null is `None`. Numbers and numeric strings are clamped to
/// [0, 1]. Anything else is malformed output.
pub(crate) fn confidence_field(
    reply: &Map<String, Value>,
    key: &str,
) -> Result<Option<f64>, CapabilityError> {
    let parsed = match reply.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(value) if value.is_finite() => Ok(Some(clamp_unit(value))),
        _ => Err(CapabilityError::MalformedOutput(format!(
            "{} is not a number",
            key
        ))),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::CannedProvider;
    use super::*;
    use serde_json::json;

    fn env(reply: &str) -> CapabilityEnv {
        CapabilityEnv::new(Arc::new(CannedProvider(reply.to_string())))
    }

    #[test]
    fn test_standard_registry_order() {
        let registry = CapabilityRegistry::standard(env("{}"));
        let ids: Vec<_> = registry.list().map(|c| c.id().to_string()).collect();
        assert_eq!(
            ids,
            vec![
                "records_wrangler",
                "communication_guru",
                "legal_researcher",
                "voice_bot_scheduler",
                "evidence_sorter"
            ]
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = CapabilityRegistry::standard(env("{}"));
        let again = Arc::new(RecordsWrangler::new(env("{}")));
        assert!(matches!(
            registry.register(again),
            Err(EngineError::DuplicateCapability(id)) if id == "records_wrangler"
        ));
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_contains_tracks_registration() {
        let mut registry = CapabilityRegistry::new();
        assert!(!registry.contains("records_wrangler"));
        registry
            .register(Arc::new(RecordsWrangler::new(env("{}"))))
            .unwrap();
        assert!(registry.contains("records_wrangler"));
        assert!(!registry.contains("evidence_sorter"));
    }

    #[tokio::test]
    async fn test_ask_json_rejects_prose() {
        let ctx = TaskContext::new("records_analysis", sdk::Priority::High, "n/a");
        let err = env("Sorry, I can't help with that.")
            .ask_json("sys", "{}", "case", &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::MalformedOutput(_)));
    }

    #[test]
    fn test_confidence_field_variants() {
        let reply = json!({
            "a": 0.4,
            "b": "0.9",
            "c": 7,
            "d": "high",
            "e": null
        });
        let reply = reply.as_object().unwrap();

        assert_eq!(confidence_field(reply, "a").unwrap(), Some(0.4));
        assert_eq!(confidence_field(reply, "b").unwrap(), Some(0.9));
        assert_eq!(confidence_field(reply, "c").unwrap(), Some(1.0));
        assert!(confidence_field(reply, "d").is_err());
        assert_eq!(confidence_field(reply, "e").unwrap(), None);
        assert_eq!(confidence_field(reply, "missing").unwrap(), None);
    }

    #[test]
    fn test_object_list_fills_defaults() {
        let reply = json!({"items": [{"type": "x"}, "stray", {"type": "y", "urgency": "high"}]});
        let items = object_list(
            reply.as_object().unwrap(),
            "items",
            &[("urgency", json!("medium"))],
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["urgency"], "medium");
        assert_eq!(items[1]["urgency"], "high");
    }
}
