//! Command-line interface for drawbridge.
//!
//! This module handles CLI argument parsing and the runtime options passed
//! into the application.

use clap::Parser;

use crate::config::LogLevel;

/// drawbridge - diagram workspace with an AI assistant panel
#[derive(Parser)]
#[command(name = "drawbridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log verbosity (error, warn, info, debug, trace); overrides the
    /// config file
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Diagram editor base URL for this run (overrides config and the
    /// DRAWBRIDGE_DIAGRAMS_URL environment variable)
    #[arg(long, value_name = "URL")]
    pub diagrams_url: Option<String>,

    /// Exit after the specified number of seconds
    #[arg(long, value_name = "SECONDS")]
    pub exit_after: Option<f64>,
}

/// Runtime options passed from CLI to the application
#[derive(Clone, Debug, Default)]
pub struct RuntimeOptions {
    /// Log level override from --log-level
    pub log_level: Option<LogLevel>,
    /// Diagram editor base URL override
    pub diagrams_url: Option<String>,
    /// Exit after this many seconds
    pub exit_after: Option<f64>,
}

/// Result of CLI processing
pub enum CliResult {
    /// Continue with normal application startup, with runtime options
    Continue(RuntimeOptions),
    /// Exit with the given code
    Exit(i32),
}

/// Process CLI arguments
pub fn process_cli() -> CliResult {
    let cli = Cli::parse();

    let log_level = match cli.log_level.as_deref() {
        Some(raw) => match raw.parse::<LogLevel>() {
            Ok(level) => Some(level),
            Err(e) => {
                eprintln!("drawbridge: {e}");
                return CliResult::Exit(2);
            }
        },
        None => None,
    };

    CliResult::Continue(RuntimeOptions {
        log_level,
        diagrams_url: cli.diagrams_url,
        exit_after: cli.exit_after,
    })
}
