//! API key lookup and secret scrubbing
//!
//! Provider keys are read from the process environment and wrapped in
//! [`SecretString`] as soon as they are read. Anything that might echo a
//! key back (provider error bodies, request errors) goes through
//! [`SecretManager::scrub`] before it is logged or returned.

pub mod string;

pub use string::SecretString;

use regex::Regex;
use sdk::errors::EngineError;
use std::sync::{Arc, OnceLock};

type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// SecretManager resolves provider API keys.
///
/// The default lookup reads environment variables. Tests inject their own
/// lookup with [`SecretManager::with_lookup`] so they never touch the real
/// environment.
#[derive(Clone)]
pub struct SecretManager {
    lookup: Lookup,
}

/// Regex patterns for detecting common secret formats.
/// These are compiled once and reused for performance.
static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Initializes and returns the secret detection patterns.
///
/// Patterns match:
/// - OpenAI API keys: sk-[a-zA-Z0-9]{20,}
/// - Anthropic API keys: sk-ant-...
/// - Bearer tokens: Bearer\s+[^\s]{20,}
/// - x-api-key headers echoed back by a proxy
fn get_secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        vec![
            // Covers sk-proj-, sk-ant-api03- and friends
            Regex::new(r"sk-[a-zA-Z0-9\-_]{20,}").expect("Invalid sk- pattern"),
            Regex::new(r"Bearer\s+[^\s]{20,}").expect("Invalid Bearer pattern"),
            Regex::new(r"(?i)x-api-key:\s*[^\s]{16,}").expect("Invalid x-api-key pattern"),
        ]
    })
}

impl SecretManager {
    /// Creates a SecretManager backed by the process environment.
    pub fn from_env() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a SecretManager backed by a custom lookup.
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Arc::new(lookup),
        }
    }

    /// Retrieves a secret by name.
    ///
    /// # Errors
    /// Returns `EngineError::MissingApiKey` naming the variable when it is
    /// unset or blank. The error never contains a value.
    pub fn get_secret(&self, key: &str) -> Result<SecretString, EngineError> {
        match (self.lookup)(key) {
            Some(value) => {
                let secret = SecretString::new(value);
                if secret.is_empty() {
                    return Err(EngineError::MissingApiKey(key.to_string()));
                }
                tracing::debug!("Resolved secret '{}'", key);
                Ok(secret)
            }
            None => Err(EngineError::MissingApiKey(key.to_string())),
        }
    }

    /// Checks if a secret is available without reading it into a wrapper.
    pub fn has_secret(&self, key: &str) -> bool {
        (self.lookup)(key).is_some_and(|value| !value.trim().is_empty())
    }

    /// Scrubs secrets from text by replacing them with [REDACTED].
    ///
    /// # Examples
    /// ```
    /// use docket_engine::secrets::SecretManager;
    ///
    /// let scrubbed = SecretManager::scrub("My API key is sk-1234567890abcdefghij");
    /// assert_eq!(scrubbed, "My API key is [REDACTED]");
    /// ```
    pub fn scrub(text: &str) -> String {
        let patterns = get_secret_patterns();
        let mut result = text.to_string();

        for pattern in patterns {
            result = pattern.replace_all(&result, "[REDACTED]").to_string();
        }

        result
    }
}

impl std::fmt::Debug for SecretManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretManager").finish_non_exhaustive()
    }
}
