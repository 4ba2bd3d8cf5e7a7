mod cli;
mod replay;

use std::io::Write;
use std::process::ExitCode;

use loadbridge_common::{LoadBridgeError, Result};
use loadbridge_forwarder::config::{self, LoadBridgeConfig};
use loadbridge_forwarder::listener;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::EnvFilter;

use cli::Command;

const DEFAULT_LOG_DIRECTIVE: &str = "loadbridge=info";

fn load_config(args: &cli::Args) -> LoadBridgeConfig {
    let loaded = match args.config {
        Some(ref path) => config::load_from_path(path).and_then(|c| {
            config::validate(&c)?;
            Ok(c)
        }),
        None => config::load_config(),
    };
    loaded.unwrap_or_else(|e| {
        eprintln!("Config load failed, using defaults: {e}");
        LoadBridgeConfig::default()
    })
}

fn init_logging(directive: &str) {
    let (filter, invalid) = match directive.parse::<Directive>() {
        Ok(d) => (d, None),
        Err(e) => (default_directive(), Some(e)),
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(filter))
        .init();

    if let Some(e) = invalid {
        tracing::warn!("Invalid log level '{directive}' ({e}), using {DEFAULT_LOG_DIRECTIVE}");
    }
}

fn default_directive() -> Directive {
    DEFAULT_LOG_DIRECTIVE
        .parse()
        .unwrap_or_else(|_| LevelFilter::INFO.into())
}

fn print_contract(out: &mut impl Write) -> Result<()> {
    for method in &listener::ALL {
        writeln!(out, "{}\t{}\t{}", method.name, method.arity(), method.signature)?;
    }
    Ok(())
}

fn run(args: &cli::Args, config: &LoadBridgeConfig) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match args.command {
        Command::Replay { ref scenario } => {
            tracing::info!("Replaying {}", scenario.display());
            let scenario = replay::Scenario::load(scenario)?;
            let summary = replay::run(&scenario, &mut out)?;
            let summary = serde_json::to_string(&summary)
                .map_err(|e| LoadBridgeError::Other(e.to_string()))?;
            writeln!(out, "{summary}")?;
        }
        Command::Contract => print_contract(&mut out)?,
        Command::Config => writeln!(out, "{}", config::config_to_json(config))?,
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = cli::parse();

    // Config comes first: it may carry the log directive.
    let config = load_config(&args);
    init_logging(args.log_level.as_deref().unwrap_or(&config.log.level));

    tracing::debug!("loadbridge v{} starting", env!("CARGO_PKG_VERSION"));

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
