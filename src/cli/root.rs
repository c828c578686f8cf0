use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::{extract::ExtractCommand, run::RunCommand};
use crate::agent::{AgentContext, HttpAgentClient};
use crate::app::ChatApp;
use crate::config::Config;
use crate::relay::HttpContentRelay;
use crate::tui;

/// 智慧製造Chatbot - terminal front-end for the manufacturing assistant
#[derive(Parser)]
#[command(
    name = "mfgbot",
    version,
    about = "Terminal chat front-end for the smart manufacturing assistant",
    long_about = r#"mfgbot talks to a remote conversational agent and a file content extraction
service. Without a subcommand it starts the interactive chat interface.

Examples:
  mfgbot                            # Start interactive mode
  mfgbot run "今日稼動率是多少?"       # Send a single prompt
  mfgbot extract report.pdf         # Fetch extracted file content"#
)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a single prompt to the agent and print the reply
    Run(RunCommand),

    /// Ask the relay for the extracted content of a file
    Extract(ExtractCommand),
}

impl Cli {
    /// Whether the interactive interface will own the terminal
    pub fn is_interactive(&self) -> bool {
        self.command.is_none()
    }

    pub async fn execute(self, config: Config) -> Result<()> {
        if self.debug {
            debug!("Debug logging enabled");
        }

        match self.command {
            Some(Commands::Run(run_cmd)) => run_cmd.execute(&config).await,
            Some(Commands::Extract(extract_cmd)) => extract_cmd.execute(&config).await,
            None => start_interactive_mode(&config).await,
        }
    }
}

/// Build the chat controller with HTTP collaborators from configuration
pub(super) fn build_chat_app(config: &Config) -> Result<ChatApp> {
    config.validate()?;

    let context = AgentContext::from_config(config)?;
    info!("Agent session id: {}", context.session_id);

    let agent = HttpAgentClient::from_config(config, context)?;
    let relay = HttpContentRelay::from_config(config)?;
    Ok(ChatApp::new(Arc::new(agent), Arc::new(relay)))
}

async fn start_interactive_mode(config: &Config) -> Result<()> {
    info!("Starting interactive mode");

    let chat = build_chat_app(config)?;
    tui::install_panic_hook();
    tui::run(chat, config.export_dir.clone()).await?;

    info!("Application finished");
    Ok(())
}
