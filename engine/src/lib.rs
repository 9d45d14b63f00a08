//! Docket Engine Library
//!
//! Case triage orchestration: classify a case file into actionable task
//! categories, route each to an analysis capability, run the capabilities
//! concurrently, and fold their results into one report.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Secret management module
pub mod secrets;

/// LLM provider abstraction layer
pub mod llm;

/// Reference analysis capabilities
pub mod capabilities;

/// Classifier, workflow builder, dispatcher and aggregator
pub mod orchestrator;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
