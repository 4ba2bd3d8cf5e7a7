use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Forward browser load events into a listener runtime.
#[derive(Parser, Debug)]
#[command(name = "loadbridge", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level override (e.g. `loadbridge=debug`).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a TOML scenario of native load events through a forwarder and
    /// print every listener call as a JSON line.
    Replay {
        /// Scenario file.
        scenario: PathBuf,
    },
    /// Print the listener method table.
    Contract,
    /// Print the effective configuration as JSON.
    Config,
}

pub fn parse() -> Args {
    Args::parse()
}
