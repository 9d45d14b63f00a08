//! CLI interface for Docket
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags for triaging case files.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Docket case triage
///
/// Reads a case file, detects what needs doing, runs the matching analysis
/// capabilities concurrently, and prints one consolidated report.
#[derive(Parser, Debug)]
#[command(name = "docket")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a case file and print the aggregate report
    Analyze {
        /// Case file to read, or "-" for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show detected tasks and the workflow without running capabilities
    Plan {
        /// Case file to read, or "-" for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// List registered capabilities
    Capabilities,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Print the default configuration file path
    Path,
}
