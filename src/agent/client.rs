//! Agent client trait and HTTP implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    chunk::{chunk_stream, ChunkStream},
    decoder::decode_response,
    errors::{AgentError, AgentResult},
};
use crate::config::Config;

/// Identifiers sent with every agent call.
///
/// Built once at startup and handed to the client; the session id stays
/// stable for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentContext {
    pub agent_id: String,
    pub alias_id: String,
    pub session_id: String,
}

impl AgentContext {
    /// Create a context with a fresh session id
    pub fn new(agent_id: impl Into<String>, alias_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            alias_id: alias_id.into(),
            session_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn from_config(config: &Config) -> AgentResult<Self> {
        let agent_id = config
            .agent_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AgentError::ConfigError("agent_id is not set".to_string()))?;
        Ok(Self::new(agent_id, config.agent_alias_id.clone()))
    }
}

/// Trait for the remote conversational agent
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Send user text and return the response as a chunk stream
    async fn invoke(&self, input_text: &str) -> AgentResult<ChunkStream>;

    /// Send user text and decode the full reply
    async fn ask(&self, input_text: &str) -> AgentResult<String> {
        let stream = self.invoke(input_text).await?;
        decode_response(stream).await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeAgentRequest<'a> {
    input_text: &'a str,
}

/// Agent client speaking the runtime's HTTP interface
#[derive(Debug, Clone)]
pub struct HttpAgentClient {
    client: Client,
    endpoint: String,
    context: AgentContext,
}

impl HttpAgentClient {
    pub fn new(endpoint: impl Into<String>, context: AgentContext, timeout: Duration) -> AgentResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            context,
        })
    }

    pub fn from_config(config: &Config, context: AgentContext) -> AgentResult<Self> {
        Self::new(config.agent_endpoint.clone(), context, config.request_timeout())
    }

    fn invoke_url(&self) -> String {
        format!(
            "{}/agents/{}/agentAliases/{}/sessions/{}/text",
            self.endpoint.trim_end_matches('/'),
            self.context.agent_id,
            self.context.alias_id,
            self.context.session_id
        )
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn invoke(&self, input_text: &str) -> AgentResult<ChunkStream> {
        let url = self.invoke_url();
        debug!("Invoking agent at: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&InvokeAgentRequest { input_text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AgentError::StatusError { status, body });
        }

        info!(
            "Agent call accepted for session {}",
            self.context.session_id
        );
        Ok(chunk_stream(response.bytes_stream()))
    }
}
