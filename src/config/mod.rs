use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the agent runtime
    pub agent_endpoint: String,

    /// Agent identifier
    pub agent_id: Option<String>,

    /// Agent alias identifier
    pub agent_alias_id: String,

    /// File content extraction endpoint
    pub relay_url: String,

    /// Directory where exported spreadsheets are written
    pub export_dir: PathBuf,

    /// Log file used in interactive mode
    pub log_file: Option<PathBuf>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent_endpoint: "http://localhost:8080".to_string(),
            agent_id: None,
            agent_alias_id: "TSTALIASID".to_string(),
            relay_url: "http://localhost:8000/extract".to_string(),
            export_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            log_file: None,
            request_timeout_secs: 120,
        }
    }
}

impl Config {
    /// Initialize configuration from file and environment
    pub async fn init(explicit_path: Option<&Path>) -> Result<Self> {
        debug!("Initializing configuration");

        let mut config = match Self::load_from_file(explicit_path).await? {
            Some(file_config) => file_config,
            None => Self::default(),
        };

        config.load_from_env();

        Ok(config)
    }

    /// Candidate configuration files, highest priority first
    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./.mfgbot.json"), PathBuf::from("./mfgbot.json")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("mfgbot").join("mfgbot.json"));
        }

        paths
    }

    /// Load configuration from a JSON file.
    ///
    /// An explicit path must exist; otherwise the first existing candidate
    /// wins and `None` is returned when there is none.
    pub async fn load_from_file(explicit_path: Option<&Path>) -> Result<Option<Self>> {
        if let Some(path) = explicit_path {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| anyhow!("Failed to read config {}: {}", path.display(), e))?;
            return Ok(Some(serde_json::from_str(&content)?));
        }

        for path in Self::candidate_paths() {
            if path.exists() {
                debug!("Loading configuration from: {}", path.display());
                let content = tokio::fs::read_to_string(&path).await?;
                let config: Self = serde_json::from_str(&content)?;
                return Ok(Some(config));
            }
        }

        Ok(None)
    }

    /// Load configuration overrides from environment variables
    pub fn load_from_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup("MFGBOT_AGENT_ENDPOINT") {
            self.agent_endpoint = endpoint;
        }

        if let Some(agent_id) = lookup("MFGBOT_AGENT_ID") {
            self.agent_id = Some(agent_id);
        }

        if let Some(alias_id) = lookup("MFGBOT_AGENT_ALIAS_ID") {
            self.agent_alias_id = alias_id;
        }

        if let Some(relay_url) = lookup("MFGBOT_RELAY_URL") {
            self.relay_url = relay_url;
        }

        if let Some(export_dir) = lookup("MFGBOT_EXPORT_DIR") {
            self.export_dir = PathBuf::from(export_dir);
        }

        if let Some(log_file) = lookup("MFGBOT_LOG_FILE") {
            self.log_file = Some(PathBuf::from(log_file));
        }

        if let Some(timeout) = lookup("MFGBOT_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                self.request_timeout_secs = secs;
            }
        }
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        match self.agent_id.as_deref() {
            Some(id) if !id.trim().is_empty() => {}
            _ => {
                return Err(anyhow!(
                    "No agent id configured. Set MFGBOT_AGENT_ID or agent_id in mfgbot.json"
                ))
            }
        }

        if self.agent_alias_id.trim().is_empty() {
            return Err(anyhow!("agent_alias_id must not be empty"));
        }

        check_http_url("agent_endpoint", &self.agent_endpoint)?;
        check_http_url("relay_url", &self.relay_url)?;

        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be greater than 0"));
        }

        Ok(())
    }
}

fn check_http_url(field: &str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!("{} must be an http(s) URL, got '{}'", field, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid() -> Config {
        Config {
            agent_id: Some("AGENT123".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_default_config_requires_agent_id() {
        assert!(Config::default().validate().is_err());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_urls_and_timeout() {
        let mut config = valid();
        config.relay_url = "ftp://files".to_string();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MFGBOT_AGENT_ID", "A1"),
            ("MFGBOT_AGENT_ALIAS_ID", "ALIAS"),
            ("MFGBOT_RELAY_URL", "https://relay.example/extract"),
            ("MFGBOT_TIMEOUT_SECS", "30"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.agent_id.as_deref(), Some("A1"));
        assert_eq!(config.agent_alias_id, "ALIAS");
        assert_eq!(config.relay_url, "https://relay.example/extract");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_timeout_env_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "MFGBOT_TIMEOUT_SECS").then(|| "soon".to_string()));
        assert_eq!(config.request_timeout_secs, 120);
    }

    #[tokio::test]
    async fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mfgbot.json");
        std::fs::write(&path, r#"{"agent_id": "FILE", "request_timeout_secs": 5}"#).unwrap();

        let config = Config::load_from_file(Some(&path)).await.unwrap().unwrap();
        assert_eq!(config.agent_id.as_deref(), Some("FILE"));
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.agent_alias_id, "TSTALIASID");
    }

    #[tokio::test]
    async fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(Config::load_from_file(Some(&missing)).await.is_err());
    }
}
