//! LLM Provider Abstraction Layer
//!
//! This module provides a common interface for the text-generation providers
//! (OpenAI, Anthropic, Ollama) that back the reference capabilities. One
//! provider is chosen at startup by [`select::build_provider`] and shared by
//! every capability through an `Arc<dyn LLMProvider>`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub mod anthropic;
pub mod ollama;
pub mod openai;
pub mod select;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl LLMError {
    /// Map a non-success HTTP status and body to an error.
    ///
    /// The body is scrubbed because some gateways echo request headers back.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let body = crate::secrets::SecretManager::scrub(body);
        match status.as_u16() {
            401 | 403 => Self::AuthenticationFailed(body),
            429 => Self::RateLimitExceeded,
            500..=599 => Self::ProviderUnavailable(format!("{}: {}", status, body)),
            _ => Self::InvalidRequest(body),
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::NetworkError(crate::secrets::SecretManager::scrub(&err.to_string()))
        }
    }
}

/// Message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender (user, assistant, system)
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User message
    User,

    /// Assistant message
    Assistant,

    /// System message
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// Sampling parameters shared by every provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&crate::config::LLMConfig> for SamplingParams {
    fn from(config: &crate::config::LLMConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Response from an LLM provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LLMResponse {
    /// The generated text
    pub content: String,
}

impl LLMResponse {
    /// Create a new response
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Extract the JSON object the model was asked to produce
    pub fn json_object(&self) -> Option<Map<String, Value>> {
        extract_json_object(&self.content)
    }
}

/// LLM Provider trait that all providers must implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "ollama", "openai", "anthropic")
    fn name(&self) -> &str;

    /// Returns true if this is a local provider (e.g., Ollama), false for cloud providers
    fn is_local(&self) -> bool;

    /// Generate a response from the LLM
    ///
    /// # Arguments
    /// * `messages` - Conversation including the system prompt and the user turn
    ///
    /// # Returns
    /// * `Ok(LLMResponse)` - The generated text
    /// * `Err(LLMError)` - If the request fails
    async fn generate(&self, messages: &[Message]) -> Result<LLMResponse>;

    /// Check if the provider is currently healthy and available
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}

/// Extract a JSON object from model output.
///
/// Handles the formats models actually produce:
/// 1. Raw JSON: `{...}`
/// 2. Fenced JSON (with or without trailing text): ` ```json\n{...}\n``` `
/// 3. An object embedded in prose, found by scanning for the first `{`
pub fn extract_json_object(content: &str) -> Option<Map<String, Value>> {
    let trimmed = content.trim();

    // Pattern 1: Raw JSON
    if let Some(obj) = try_parse_object(trimmed) {
        return Some(obj);
    }

    // Pattern 2: Extract from markdown code fences (even with trailing text)
    if let Some(inner) = extract_fenced_json(trimmed) {
        if let Some(obj) = try_parse_object(inner.trim()) {
            return Some(obj);
        }
    }

    // Pattern 3: Scan for the first balanced object in mixed prose
    let mut offset = 0;
    while let Some(pos) = trimmed[offset..].find('{') {
        let start = offset + pos;
        if let Some(candidate) = extract_balanced_json(&trimmed[start..]) {
            if let Some(obj) = try_parse_object(candidate) {
                return Some(obj);
            }
        }
        offset = start + 1;
    }

    None
}

fn try_parse_object(s: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(s).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Extract the body of the first markdown code fence in the text.
///
/// Works even when there is trailing prose after the closing ```.
/// Returns `None` if no fenced block is found.
fn extract_fenced_json(content: &str) -> Option<&str> {
    // Find opening fence
    let fence_start = content.find("```")?;
    let after_opening = &content[fence_start + 3..];

    // Skip the language tag line (e.g. "json\n")
    let body_start_rel = after_opening.find('\n')? + 1;
    let body_start = fence_start + 3 + body_start_rel;

    // Find closing fence after the body starts
    let closing = content[body_start..].find("```")?;
    let body_end = body_start + closing;

    if body_start >= body_end {
        return None;
    }

    Some(&content[body_start..body_end])
}

/// Extract a balanced JSON object starting at position 0 of `s`.
///
/// Counts `{` / `}` depth, respecting string literals, to find the
/// matching close brace.
fn extract_balanced_json(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let user_msg = Message::user("Hello");
        assert_eq!(user_msg.role, MessageRole::User);
        assert_eq!(user_msg.content, "Hello");

        let assistant_msg = Message::assistant("Hi there");
        assert_eq!(assistant_msg.role, MessageRole::Assistant);

        let system_msg = Message::system("You are a paralegal");
        assert_eq!(system_msg.role, MessageRole::System);
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::user("test");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""role":"user""#));
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, deserialized);
    }

    #[test]
    fn test_extract_raw_json() {
        let obj = extract_json_object(r#"{"confidence_score": 0.9}"#).unwrap();
        assert_eq!(obj["confidence_score"], 0.9);
    }

    #[test]
    fn test_extract_fenced_json_with_trailing_prose() {
        let content = "Here you go:\n```json\n{\"tone\": \"calm\"}\n```\nLet me know!";
        let obj = extract_json_object(content).unwrap();
        assert_eq!(obj["tone"], "calm");
    }

    #[test]
    fn test_extract_embedded_json_skips_unbalanced_prefix() {
        let content = r#"Note {not json. Result: {"a": {"b": "}"}} trailing"#;
        let obj = extract_json_object(content).unwrap();
        assert_eq!(obj["a"]["b"], "}");
    }

    #[test]
    fn test_extract_rejects_arrays_and_prose() {
        assert!(extract_json_object("[1, 2, 3]").is_none());
        assert!(extract_json_object("I could not analyse this file.").is_none());
    }

    #[test]
    fn test_status_mapping() {
        use reqwest::StatusCode;
        assert!(matches!(
            LLMError::from_status(StatusCode::UNAUTHORIZED, "bad key"),
            LLMError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            LLMError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            LLMError::RateLimitExceeded
        ));
        assert!(matches!(
            LLMError::from_status(StatusCode::BAD_GATEWAY, ""),
            LLMError::ProviderUnavailable(_)
        ));
        assert!(matches!(
            LLMError::from_status(StatusCode::BAD_REQUEST, ""),
            LLMError::InvalidRequest(_)
        ));
    }

    #[test]
    fn test_status_body_is_scrubbed() {
        let err = LLMError::from_status(
            reqwest::StatusCode::UNAUTHORIZED,
            "Incorrect API key provided: sk-abcdefghijklmnopqrstuvwxyz",
        );
        assert!(!err.to_string().contains("sk-abcdef"));
    }
}
