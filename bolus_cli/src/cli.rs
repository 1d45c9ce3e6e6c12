//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "bolus", version, about = "Insulin bolus calculator")]
pub struct Cli {
    /// Path to config TOML; built-in defaults are used when the file is absent
    #[arg(long, value_name = "FILE", default_value = "etc/bolus.toml")]
    pub config: PathBuf,

    /// Profile CSV (strict header); overrides [profiles].csv from the config
    #[arg(long, value_name = "FILE")]
    pub profiles: Option<PathBuf>,

    /// Print results and errors as JSON instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG takes precedence
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Calculation strategy selection.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ModeArg {
    /// Use the config default, else infer from the request flags
    Auto,
    /// Carb dose plus non-negative correction; adjustment flags ignored
    Simple,
    /// Adjusted dose; requires a complete profile
    Full,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Calculate a bolus for a meal
    Dose {
        /// Carbohydrate grams in the meal
        #[arg(long, allow_negative_numbers = true)]
        carbs: f32,
        /// Current blood glucose in mg/dL
        #[arg(long, value_name = "MGDL")]
        glucose: Option<u16>,
        /// User whose stored profile to use; omitted means no profile
        #[arg(long)]
        user: Option<String>,
        /// Activity level: normal, light or intense
        #[arg(long, value_name = "LEVEL")]
        activity: Option<String>,
        /// Apply the sick-day increase
        #[arg(long, action = ArgAction::SetTrue)]
        sick: bool,
        /// Apply the stress increase
        #[arg(long, action = ArgAction::SetTrue)]
        stress: bool,
        /// Calculation strategy
        #[arg(long, value_enum, default_value = "auto")]
        mode: ModeArg,
    },
    /// Convert between "1:N" ratio notation and units per gram
    Ratio {
        #[command(subcommand)]
        op: RatioOp,
    },
    /// Show a user's resolved profile and what is missing
    Profile {
        #[arg(long)]
        user: String,
    },
    /// Validate config and profile store
    SelfCheck,
}

#[derive(Subcommand, Debug)]
pub enum RatioOp {
    /// Units per gram to "1:N"
    Format {
        #[arg(allow_negative_numbers = true)]
        units_per_gram: f32,
    },
    /// "U:G" (or a plain number) to units per gram
    Parse { text: String },
}
