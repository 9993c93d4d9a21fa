//! Clap derive structures for the `sprinkly` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sprinkly -- drive an irrigation controller from the command line
#[derive(Debug, Parser)]
#[command(
    name = "sprinkly",
    version,
    about = "Control OpenSprinkler-style irrigation controllers from the command line",
    long_about = "Inspect and operate an irrigation controller over its HTTP/JSON API.\n\n\
        Reads the controller state, runs and stops stations manually,\n\
        toggles operation and sets rain delays.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile to use
    #[arg(long, short = 'p', env = "SPRINKLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device URL (overrides profile)
    #[arg(long, short = 'u', env = "SPRINKLY_URL", global = true)]
    pub url: Option<String>,

    /// Device password (overrides profile)
    #[arg(long, env = "SPRINKLY_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SPRINKLY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "SPRINKLY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show controller state and every station
    #[command(alias = "st")]
    Status,

    /// List, run, stop, enable or disable stations
    #[command(alias = "zones", alias = "s")]
    Stations(StationsArgs),

    /// Enable controller operation
    Enable,

    /// Disable controller operation (scheduled programs stop running)
    Disable,

    /// Set a rain delay in hours (0 clears it)
    RainDelay(RainDelayArgs),

    /// Keep refreshing and redraw the status until interrupted
    Watch(WatchArgs),

    /// Inspect the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Stations ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StationsArgs {
    #[command(subcommand)]
    pub command: StationsCommand,
}

#[derive(Debug, Subcommand)]
pub enum StationsCommand {
    /// List every station with its run state
    #[command(alias = "ls")]
    List,

    /// Start a manual run
    Start {
        /// Station index or name
        station: String,

        /// Run duration in seconds
        #[arg(long, short = 'd', value_parser = clap::value_parser!(u32).range(1..))]
        duration: u32,
    },

    /// Stop a running station
    Stop {
        /// Station index or name
        station: String,
    },

    /// Allow a station to run
    Enable {
        /// Station index or name
        station: String,
    },

    /// Exclude a station from running
    Disable {
        /// Station index or name
        station: String,
    },
}

// ── Controller ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RainDelayArgs {
    /// Delay in hours
    pub hours: u32,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Refresh interval (e.g. "10s", "1m")
    #[arg(long, short = 'i', default_value = "10s", value_parser = parse_interval)]
    pub interval: Duration,
}

fn parse_interval(raw: &str) -> Result<Duration, String> {
    let interval = humantime::parse_duration(raw).map_err(|e| e.to_string())?;
    if interval.is_zero() {
        return Err("interval must be greater than zero".into());
    }
    Ok(interval)
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Show the effective configuration (passwords redacted)
    Show,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
