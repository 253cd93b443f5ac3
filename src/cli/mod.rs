//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "relay")]
#[command(author, version, about = "Relays charting alerts to a broker as market orders")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (overrides config)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the webhook server
    Serve(ServeArgs),
    /// Resolve an alert symbol against a user's broker
    Resolve(ResolveArgs),
    /// List open positions on a user's broker account
    Positions(PositionsArgs),
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Bind address (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Use an in-memory paper broker listing these symbols (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub paper: Vec<String>,
}

#[derive(clap::Args)]
pub struct ResolveArgs {
    /// User whose active broker account is used
    #[arg(short, long)]
    pub user: String,

    /// Alert symbol, e.g. XAUUSD
    #[arg(short, long)]
    pub symbol: String,
}

#[derive(clap::Args)]
pub struct PositionsArgs {
    /// User whose active broker account is used
    #[arg(short, long)]
    pub user: String,

    /// Only positions on this broker symbol
    #[arg(short, long)]
    pub symbol: Option<String>,
}
