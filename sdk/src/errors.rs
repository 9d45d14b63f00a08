//! Error types and handling
//!
//! This module provides the error types used throughout the Docket engine
//! outside of a single request. Failures inside one request are never raised
//! to the caller: capability failures become `unavailable` results and stage
//! failures become a degraded report. What is left here are the errors of
//! setting things up: configuration, provider selection, secrets and registration.
//!
//! All errors implement the `DocketErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! Error messages never include API keys or other secrets.

use thiserror::Error;

/// Trait for Docket error extensions
pub trait DocketErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be fixed by the user and retried with a fresh
    /// request. Non-recoverable errors need a code or installation change.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Examples
///
/// ```
/// use sdk::errors::{DocketErrorExt, EngineError};
///
/// let error = EngineError::MissingApiKey("OPENAI_API_KEY".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal = EngineError::DuplicateCapability("records_wrangler".to_string());
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // LLM provider errors
    #[error("Unknown LLM provider: {0}")]
    UnknownProvider(String),

    #[error("Missing API key: {0}")]
    MissingApiKey(String),

    // Capability registry errors
    #[error("Capability registered twice: {0}")]
    DuplicateCapability(String),
}

impl DocketErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            // Configuration errors
            Self::Config(_) => "Check your config.toml file for errors",

            // LLM provider errors
            Self::UnknownProvider(_) => "Set llm.default_provider to openai, anthropic, or ollama",
            Self::MissingApiKey(_) => "Export the provider's API key in your environment",

            // Capability registry errors
            Self::DuplicateCapability(_) => "Each capability id may only be registered once",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Non-recoverable errors
            Self::DuplicateCapability(_) => false,

            // All other errors are potentially recoverable
            _ => true,
        }
    }
}
