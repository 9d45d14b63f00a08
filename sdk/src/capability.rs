//! Capability trait and shared result shape
//!
//! A capability is a pluggable unit of case analysis. The orchestrator treats
//! every capability as a black box: it hands over the case text and a
//! [`TaskContext`], and expects a [`CapabilityOutput`] back (or an error).
//!
//! Every capability reports the same minimal shape: an opaque payload, an
//! optional confidence, an ordered list of recommended actions, and an
//! optional one-line headline finding. The aggregator only ever reads those
//! fields, so it never needs to know which capability produced them.
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use sdk::{Capability, CapabilityError, CapabilityOutput, TaskContext};
//!
//! struct WordCounter;
//!
//! #[async_trait]
//! impl Capability for WordCounter {
//!     fn id(&self) -> &str {
//!         "word_counter"
//!     }
//!
//!     fn description(&self) -> &str {
//!         "Counts words in the case file"
//!     }
//!
//!     async fn run(
//!         &self,
//!         text: &str,
//!         _context: &TaskContext,
//!     ) -> Result<CapabilityOutput, CapabilityError> {
//!         let mut payload = serde_json::Map::new();
//!         payload.insert("words".into(), text.split_whitespace().count().into());
//!         Ok(CapabilityOutput::new(payload).with_confidence(1.0))
//!     }
//! }
//! ```

use crate::types::TaskContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors a capability may return
///
/// The dispatcher turns any of these into an `unavailable` result; they never
/// abort sibling capabilities.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The text-generation provider behind the capability failed
    #[error("provider error: {0}")]
    Provider(String),

    /// The capability produced output that does not fit the expected shape
    #[error("malformed output: {0}")]
    MalformedOutput(String),

    /// Any other failure inside the capability
    #[error("{0}")]
    Failed(String),
}

/// Result shape shared by every capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityOutput {
    /// Capability-specific structured result
    pub payload: Map<String, Value>,

    /// Confidence in the analysis, in [0, 1]
    pub confidence: Option<f64>,

    /// Recommended actions, in the capability's own order
    pub actions: Vec<String>,

    /// Short headline finding suitable for a summary line
    pub headline: Option<String>,
}

impl CapabilityOutput {
    /// Create an output carrying only a payload
    pub fn new(payload: Map<String, Value>) -> Self {
        Self {
            payload,
            ..Self::default()
        }
    }

    /// Set the confidence, clamped to [0, 1]
    ///
    /// NaN is kept as-is so the dispatcher can reject it as malformed.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(clamp_unit(confidence));
        self
    }

    /// Append an action; blank actions are ignored
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        let action = action.into();
        if !action.trim().is_empty() {
            self.actions.push(action.trim().to_string());
        }
        self
    }

    /// Set the headline finding
    pub fn with_headline(mut self, headline: impl Into<String>) -> Self {
        self.headline = Some(headline.into());
        self
    }
}

/// Clamp a value to [0, 1], leaving NaN untouched
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        value
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Capability trait that every analysis unit must implement
#[async_trait]
pub trait Capability: Send + Sync {
    /// Stable identifier used as the key in workflow and report
    fn id(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Analyse the case text for the given task
    ///
    /// Implementations should bound their own remote calls, but the
    /// dispatcher enforces a timeout regardless.
    async fn run(&self, text: &str, context: &TaskContext)
        -> Result<CapabilityOutput, CapabilityError>;
}
