//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "blastgate", version, about = "Dust-collection blast-gate controller")]
pub struct Cli {
    /// Path to config TOML; built-in defaults (four simulated gates) when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Gate roster CSV (strict header), replaces [[gates]] from the config
    #[arg(long, value_name = "FILE")]
    pub roster: Option<PathBuf>,

    /// Log and report as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG wins when set
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the controller; operator commands are read from stdin
    Run {
        /// Stop after this many ticks (default: run until Ctrl-C)
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,
        /// Override controller.tick_ms
        #[arg(long, value_name = "MS")]
        tick_ms: Option<u64>,
        /// Override controller.grace_ms
        #[arg(long, value_name = "MS")]
        grace_ms: Option<u64>,
        /// Do not read operator commands from stdin
        #[arg(long, action = ArgAction::SetTrue)]
        no_console: bool,
    },
    /// Home every gate and report which ones are referenced
    SelfCheck,
    /// Parse and validate the configuration, then print the roster
    CheckConfig,
}
