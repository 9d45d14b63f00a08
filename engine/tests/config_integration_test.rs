//! Integration tests for configuration management
//!
//! These tests verify that the Config struct can be loaded from disk,
//! overridden from the environment, and validated.

use docket_engine::config::{Config, ProviderKind};
use docket_engine::orchestrator::FallbackPolicy;
use sdk::EngineError;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_config_toml_parsing() {
    let file = write_config(
        r#"
[core]
log_level = "debug"

[llm]
default_provider = "ollama"
temperature = 0.2
max_tokens = 1024

[llm.ollama]
base_url = "http://127.0.0.1:11434"
model = "llama3.1:70b"

[dispatch]
capability_timeout_secs = 15

[classifier]
fallback = "none"
"#,
    );

    let config = Config::load_from_path(file.path()).unwrap();

    assert_eq!(config.core.log_level, "debug");
    assert_eq!(config.llm.default_provider, ProviderKind::Ollama);
    assert_eq!(config.llm.temperature, 0.2);
    assert_eq!(config.llm.max_tokens, 1024);
    assert_eq!(config.llm.selected_model(), "llama3.1:70b");
    assert_eq!(config.dispatch.capability_timeout(), Duration::from_secs(15));
    assert_eq!(config.classifier.fallback, FallbackPolicy::Disabled);

    // Untouched sections keep their defaults
    assert_eq!(config.llm.openai.base_url, "https://api.openai.com/v1");
    assert_eq!(config.llm.anthropic.model, "claude-3-5-sonnet-20241022");
}

#[test]
fn test_empty_file_is_default_config() {
    let file = write_config("");
    let config = Config::load_from_path(file.path()).unwrap();

    assert_eq!(config.core.log_level, "info");
    assert_eq!(config.dispatch.capability_timeout_secs, 60);
    assert_eq!(config.classifier.fallback, FallbackPolicy::DefaultPair);
}

#[test]
fn test_invalid_values_are_rejected() {
    for (contents, needle) in [
        ("[core]\nlog_level = \"loud\"", "Invalid log level"),
        ("[llm]\ntemperature = 3.5", "temperature"),
        ("[llm]\nmax_tokens = 0", "max_tokens"),
        ("[dispatch]\ncapability_timeout_secs = 0", "capability_timeout_secs"),
        ("[llm.openai]\nmodel = \"  \"", "No model configured"),
    ] {
        let file = write_config(contents);
        match Config::load_from_path(file.path()) {
            Err(EngineError::Config(msg)) => {
                assert!(msg.contains(needle), "'{}' missing from '{}'", needle, msg)
            }
            other => panic!("expected config error for {:?}, got {:?}", contents, other),
        }
    }
}

#[test]
fn test_unknown_provider_is_rejected() {
    let file = write_config("[llm]\ndefault_provider = \"gemini\"");
    assert!(Config::load_from_path(file.path()).is_err());
}

#[test]
fn test_malformed_toml() {
    let file = write_config("[core\nlog_level = ");
    match Config::load_from_path(file.path()) {
        Err(EngineError::Config(msg)) => assert!(msg.starts_with("Failed to parse config")),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::load_from_path(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(EngineError::Config(msg)) if msg.contains("Failed to read")));
}

#[test]
fn test_overrides_follow_provider_switch() {
    let mut config = Config::from_toml_str("").unwrap();
    config
        .apply_overrides(|key| match key {
            "DEFAULT_LLM_PROVIDER" => Some("anthropic".to_string()),
            "DEFAULT_MODEL" => Some("claude-3-haiku-20240307".to_string()),
            "MAX_TOKENS" => Some("2048".to_string()),
            _ => None,
        })
        .unwrap();

    assert_eq!(config.llm.default_provider, ProviderKind::Anthropic);
    assert_eq!(config.llm.anthropic.model, "claude-3-haiku-20240307");
    assert_eq!(config.llm.openai.model, "gpt-4o-mini");
    assert_eq!(config.llm.max_tokens, 2048);
    assert!(config.validate().is_ok());
}

#[test]
fn test_saved_defaults_parse_back() {
    let rendered = toml::to_string_pretty(&Config::default()).unwrap();
    let parsed = Config::from_toml_str(&rendered).unwrap();

    assert_eq!(parsed.llm.default_provider, ProviderKind::OpenAI);
    assert_eq!(parsed.llm.ollama.base_url, "http://localhost:11434");
    assert_eq!(parsed.classifier.fallback, FallbackPolicy::DefaultPair);
    assert!(parsed.validate().is_ok());
}
