use anyhow::{anyhow, Result};
use clap::Args;
use std::io::{self, Read};
use tracing::{debug, info};

use super::root::build_chat_app;
use crate::app::ChatApp;
use crate::config::Config;

/// Send a single prompt to the agent and print the reply
#[derive(Args)]
pub struct RunCommand {
    /// The prompt to send. If not provided, will read from stdin
    pub prompt: Vec<String>,
}

impl RunCommand {
    pub async fn execute(&self, config: &Config) -> Result<()> {
        debug!("Executing run command");

        let prompt = self.get_prompt()?;
        let mut app = build_chat_app(config)?;
        let reply = ask(&mut app, &prompt).await?;

        println!("{}", reply);
        Ok(())
    }

    fn get_prompt(&self) -> Result<String> {
        if !self.prompt.is_empty() {
            Ok(self.prompt.join(" "))
        } else {
            debug!("Reading prompt from stdin");
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| anyhow!("Failed to read from stdin: {}", e))?;
            Ok(buffer)
        }
    }
}

/// Send `prompt` through the controller and return the bot reply text
async fn ask(app: &mut ChatApp, prompt: &str) -> Result<String> {
    if prompt.trim().is_empty() {
        return Err(anyhow!("No prompt provided. Use arguments or pipe input via stdin."));
    }

    info!("Running prompt: {}", prompt.chars().take(50).collect::<String>());

    let reply_id = app.send(prompt).await.ok_or_else(|| {
        anyhow!(app
            .take_notice()
            .unwrap_or_else(|| "No reply received".to_string()))
    })?;

    app.messages()
        .get(reply_id)
        .map(|m| m.text.clone())
        .ok_or_else(|| anyhow!("Reply {} disappeared", reply_id.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::chunk::{AgentChunk, ChunkStream};
    use crate::agent::errors::AgentResult;
    use crate::agent::{AgentClient, AgentError};
    use crate::app::AGENT_FAILURE_NOTICE;
    use crate::relay::{ContentRelay, RelayResult};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedAgent(Option<&'static str>);

    #[async_trait]
    impl AgentClient for FixedAgent {
        async fn invoke(&self, _input_text: &str) -> AgentResult<ChunkStream> {
            match self.0 {
                Some(reply) => Ok(Box::pin(futures::stream::iter(vec![Ok(
                    AgentChunk::Payload {
                        payload: reply.as_bytes().to_vec(),
                    },
                )]))),
                None => Err(AgentError::ConfigError("offline".into())),
            }
        }
    }

    struct NoRelay;

    #[async_trait]
    impl ContentRelay for NoRelay {
        async fn fetch_content(&self, _file_name: &str) -> RelayResult<String> {
            Ok(String::new())
        }
    }

    fn app(reply: Option<&'static str>) -> ChatApp {
        ChatApp::new(Arc::new(FixedAgent(reply)), Arc::new(NoRelay))
    }

    #[tokio::test]
    async fn test_ask_returns_reply_text() {
        let mut app = app(Some("稼動率 92%"));
        assert_eq!(ask(&mut app, "稼動率?").await.unwrap(), "稼動率 92%");
    }

    #[tokio::test]
    async fn test_ask_reports_failure_notice() {
        let mut app = app(None);
        let err = ask(&mut app, "hi").await.unwrap_err();
        assert_eq!(err.to_string(), AGENT_FAILURE_NOTICE);
    }

    #[tokio::test]
    async fn test_ask_rejects_blank_prompt() {
        let mut app = app(Some("x"));
        assert!(ask(&mut app, "  \n").await.is_err());
        assert!(app.messages().is_empty());
    }

    #[test]
    fn test_prompt_words_are_joined() {
        let cmd = RunCommand {
            prompt: vec!["line".into(), "3".into()],
        };
        assert_eq!(cmd.get_prompt().unwrap(), "line 3");
    }
}
