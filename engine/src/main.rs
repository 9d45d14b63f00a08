// Docket case triage
// Main entry point for the docket binary

use clap::Parser;
use docket_engine::cli::{Cli, Command, ConfigAction};
use docket_engine::config::Config;
use docket_engine::handlers::{
    handle_analyze, handle_capabilities, handle_config_path, handle_config_show, handle_plan,
    OutputFormat,
};
use docket_engine::telemetry::init_telemetry_with_level;
use sdk::DocketErrorExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config = match &cli.config {
        Some(config_path) => Config::load_from_path(config_path),
        None => Config::load_or_create(),
    }
    .map_err(|e| anyhow::anyhow!("{}\nHint: {}", e, e.user_hint()))?;

    // --log wins over the config level; RUST_LOG wins over both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Docket v{} ({} - {})", version, commit, timestamp);

    match cli.command {
        Command::Analyze { input } => {
            tracing::info!("Analyzing case file: {}", input.display());
            handle_analyze(&input, &config, format).await
        }

        Command::Plan { input } => {
            tracing::info!("Planning case file: {}", input.display());
            handle_plan(&input, &config, format).await
        }

        Command::Capabilities => handle_capabilities(&config, format).await,

        Command::Config { action } => match action {
            ConfigAction::Show => handle_config_show(&config, format),
            ConfigAction::Path => handle_config_path(format),
        },
    }
}
