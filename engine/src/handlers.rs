//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - analyze: Run one case file through the full pipeline
//! - plan: Classify and route a case file without calling any provider
//! - capabilities: List registered capabilities
//! - config show / config path: Inspect configuration

use anyhow::{Context, Result};
use serde_json::json;
use std::fmt::{self, Write as _};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

use crate::capabilities::{CapabilityEnv, CapabilityRegistry};
use crate::config::Config;
use crate::llm::select::build_provider;
use crate::llm::LLMProvider;
use crate::orchestrator::metadata::Field;
use crate::orchestrator::{AggregateReport, Orchestrator, Plan};
use crate::secrets::SecretManager;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Read a case file, or stdin when the path is "-"
pub async fn read_case(input: &Path) -> Result<String> {
    let text = if input == Path::new("-") {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read case text from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read case file {}", input.display()))?
    };

    if text.trim().is_empty() {
        anyhow::bail!("Case text is empty");
    }
    Ok(text)
}

/// Provider and standard capability registry for the given config
fn standard_registry(config: &Config) -> (Arc<dyn LLMProvider>, CapabilityRegistry) {
    let provider = build_provider(&config.llm, SecretManager::from_env());
    let registry = CapabilityRegistry::standard(CapabilityEnv::new(Arc::clone(&provider)));
    (provider, registry)
}

/// Analyze a case file
pub async fn handle_analyze(input: &Path, config: &Config, format: OutputFormat) -> Result<()> {
    let text = read_case(input).await?;
    let (provider, registry) = standard_registry(config);

    if !provider.check_health().await {
        tracing::warn!(
            provider = provider.name(),
            "Provider is not reachable or has no API key; capabilities will report unavailable"
        );
    }

    let orchestrator = Orchestrator::from_config(config, registry);
    let report = orchestrator.process_case(&text).await;

    match format {
        OutputFormat::Text => print!("{}", render_report(&report)?),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        ),
    }

    Ok(())
}

/// Show the workflow a case file would run
pub async fn handle_plan(input: &Path, config: &Config, format: OutputFormat) -> Result<()> {
    let text = read_case(input).await?;
    let (_, registry) = standard_registry(config);
    let orchestrator = Orchestrator::from_config(config, registry);
    let plan = orchestrator
        .plan(&text)
        .context("Failed to build workflow")?;

    match format {
        OutputFormat::Text => print!("{}", render_plan(&plan)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }

    Ok(())
}

/// List registered capabilities
pub async fn handle_capabilities(config: &Config, format: OutputFormat) -> Result<()> {
    let (provider, registry) = standard_registry(config);

    match format {
        OutputFormat::Text => {
            println!("Registered Capabilities ({}):", registry.len());
            println!();
            for capability in registry.list() {
                println!("  {:<22} {}", capability.id(), capability.description());
            }
            println!();
            println!(
                "Provider: {} ({})",
                provider.name(),
                config.llm.selected_model()
            );
        }
        OutputFormat::Json => {
            let output = json!({
                "capabilities": registry.list().map(|c| {
                    json!({
                        "id": c.id(),
                        "description": c.description()
                    })
                }).collect::<Vec<_>>(),
                "provider": provider.name(),
                "model": config.llm.selected_model()
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Print the effective configuration
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
            print!("{}", rendered);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}

/// Print the default configuration path
pub fn handle_config_path(format: OutputFormat) -> Result<()> {
    let path = Config::default_config_path()?;
    match format {
        OutputFormat::Text => println!("{}", path.display()),
        OutputFormat::Json => println!("{}", json!({ "path": path })),
    }
    Ok(())
}

/// Human-readable rendering of a report
pub fn render_report(report: &AggregateReport) -> Result<String, fmt::Error> {
    let mut out = String::new();

    writeln!(out, "Docket Case Report")?;
    writeln!(out, "============================")?;
    writeln!(out, "{}", report.summary)?;
    writeln!(out)?;

    if let Some(error) = &report.error {
        writeln!(out, "⚠ Processing failed: {}", error)?;
        return Ok(out);
    }

    writeln!(out, "Detected Tasks:")?;
    for (i, signal) in report.detected_tasks.iter().enumerate() {
        writeln!(
            out,
            "  {}. {:<22} {:<7} {} indicator(s)",
            i + 1,
            signal.task_type.as_str(),
            signal.priority.as_str(),
            signal.match_count
        )?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "Capabilities ({} of {} succeeded):",
        report.capabilities_successful, report.capabilities_attempted
    )?;
    for result in report.capability_outputs.values() {
        let elapsed = result.execution_time.as_secs_f64();
        match &result.error {
            None => {
                let confidence = result
                    .confidence
                    .map_or_else(|| "-".to_string(), |c| format!("{:.2}", c));
                writeln!(
                    out,
                    "  ✓ {:<22} confidence {:<5} ({:.1}s)",
                    result.capability_id, confidence, elapsed
                )?;
            }
            Some(error) => {
                writeln!(
                    out,
                    "  ✗ {:<22} {} ({:.1}s)",
                    result.capability_id, error, elapsed
                )?;
            }
        }
    }
    writeln!(out)?;

    if !report.recommended_actions.is_empty() {
        writeln!(out, "Recommended Actions:")?;
        for (i, action) in report.recommended_actions.iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, action)?;
        }
        writeln!(out)?;
    }

    let metadata = &report.context_metadata;
    let fields: [(&str, Option<&Field>); 5] = [
        ("Client", metadata.client_name.as_ref()),
        ("Case number", metadata.case_number.as_ref()),
        ("Case type", metadata.case_type.as_ref()),
        ("Insurer", metadata.insurance_company.as_ref()),
        ("Incident date", metadata.date_of_incident.as_ref()),
    ];
    writeln!(out, "Case Metadata:")?;
    for (label, field) in fields {
        if let Some(field) = field {
            writeln!(
                out,
                "  {:<15} {} ({:.2})",
                format!("{}:", label),
                field.value,
                field.confidence
            )?;
        }
    }
    for provider in &metadata.medical_providers {
        writeln!(out, "  {:<15} {}", "Provider:", provider.value)?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "Overall confidence: {:.2}   Elapsed: {:.2}s",
        report.overall_confidence,
        report.elapsed_time.as_secs_f64()
    )?;
    Ok(out)
}

/// Human-readable rendering of a plan
pub fn render_plan(plan: &Plan) -> Result<String, fmt::Error> {
    let mut out = String::new();

    writeln!(out, "Detected Tasks:")?;
    for signal in &plan.detected_tasks {
        writeln!(
            out,
            "  {:<22} {:<7} {} indicator(s), confidence {:.2}",
            signal.task_type.as_str(),
            signal.priority.as_str(),
            signal.match_count,
            signal.confidence
        )?;
    }
    writeln!(out)?;

    writeln!(out, "Workflow:")?;
    if plan.workflow.is_empty() {
        writeln!(out, "  (empty)")?;
    }
    for (i, entry) in plan.workflow.iter().enumerate() {
        writeln!(
            out,
            "  {}. {:<22} <- {}",
            i + 1,
            entry.capability_id,
            entry.task_signal.task_type
        )?;
    }
    Ok(out)
}
