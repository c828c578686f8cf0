use anyhow::{anyhow, Result};
use clap::Args;
use tracing::{debug, info};

use crate::app::file_content_text;
use crate::config::Config;
use crate::relay::{ContentRelay, HttpContentRelay};

/// Ask the relay for the extracted content of a file
#[derive(Args)]
pub struct ExtractCommand {
    /// File name known to the extraction service
    pub file_name: String,

    /// Print only the content, without the chat prefix
    #[arg(short = 'r', long = "raw")]
    pub raw: bool,
}

impl ExtractCommand {
    pub async fn execute(&self, config: &Config) -> Result<()> {
        debug!("Executing extract command");

        let relay = HttpContentRelay::from_config(config)?;
        let output = self.fetch(&relay).await?;

        println!("{}", output);
        Ok(())
    }

    async fn fetch(&self, relay: &dyn ContentRelay) -> Result<String> {
        let file_name = self.file_name.trim();
        if file_name.is_empty() {
            return Err(anyhow!("File name must not be empty"));
        }

        info!("Fetching content of {}", file_name);
        let content = relay.fetch_content(file_name).await?;

        Ok(if self.raw {
            content
        } else {
            file_content_text(&content)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::{RelayError, RelayResult};
    use async_trait::async_trait;

    struct MapRelay;

    #[async_trait]
    impl ContentRelay for MapRelay {
        async fn fetch_content(&self, file_name: &str) -> RelayResult<String> {
            match file_name {
                "spc.csv" => Ok("cpk=1.33".to_string()),
                other => Err(RelayError::RemoteError(format!("{} not found", other))),
            }
        }
    }

    fn command(file_name: &str, raw: bool) -> ExtractCommand {
        ExtractCommand {
            file_name: file_name.to_string(),
            raw,
        }
    }

    #[tokio::test]
    async fn test_fetch_formats_content() {
        assert_eq!(
            command(" spc.csv ", false).fetch(&MapRelay).await.unwrap(),
            "檔案內容：\ncpk=1.33"
        );
        assert_eq!(command("spc.csv", true).fetch(&MapRelay).await.unwrap(), "cpk=1.33");
    }

    #[tokio::test]
    async fn test_fetch_propagates_relay_errors() {
        let err = command("gone.pdf", false).fetch(&MapRelay).await.unwrap_err();
        assert!(err.to_string().contains("gone.pdf"));
        assert!(command("  ", false).fetch(&MapRelay).await.is_err());
    }
}
