use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod agent;
mod app;
mod chat;
mod cli;
mod config;
mod export;
mod relay;
mod tui;

use cli::Cli;
use config::Config;

const DEFAULT_LOG_FILE: &str = "mfgbot.log";

#[tokio::main]
async fn main() {
    // Log panics before the default report
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        error!("Application panicked: {}", panic_info);
        default_hook(panic_info);
    }));

    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match Config::init(cli.config.as_deref()).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&cli, &config) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => tracing::debug!("No .env file found or error loading it: {}", e),
    }

    if let Err(e) = cli.execute(config).await {
        error!("Application error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Interactive mode logs to a file so the terminal stays clean;
/// subcommands log to stderr
fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    let default_directive = if cli.debug { "mfgbot=debug" } else { "mfgbot=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if cli.is_interactive() {
        let path = config
            .log_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", path.display(), e))?;

        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}
