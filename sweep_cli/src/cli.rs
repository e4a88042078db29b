//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(
    name = "cleansweep",
    version,
    about = "Automatic print removal for a networked 3D printer"
)]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/cleansweep.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Join the network, calibrate the arm and watch the printer
    Run {
        /// Stop after this many controller ticks (default: run until Ctrl-C)
        #[arg(long, value_name = "N")]
        max_ticks: Option<u64>,
    },
    /// Tare the empty bin, then print one stabilized reading
    Weigh,
    /// Move the arm between two angles
    Sweep {
        /// Start angle in degrees
        #[arg(long, value_name = "DEG")]
        from: u16,
        /// End angle in degrees
        #[arg(long, value_name = "DEG")]
        to: u16,
    },
    /// Quick health check (scale responds, arm accepts its angles)
    SelfCheck,
}
