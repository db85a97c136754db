pub mod types;

use std::path::Path;

use crate::error::{Result, ScrapeError};
use types::Config;

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        ScrapeError::Config(format!(
            "failed to read config file {}: {e}",
            path.display()
        ))
    })?;
    let config: Config = serde_yml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.scraper.page_size == 0 {
        return Err(ScrapeError::Config("scraper.page_size must be at least 1".into()));
    }
    if config.server.max_concurrent_sessions == 0 {
        return Err(ScrapeError::Config(
            "server.max_concurrent_sessions must be at least 1".into(),
        ));
    }
    if config.scraper.currency_marker.trim().is_empty() {
        return Err(ScrapeError::Config(
            "scraper.currency_marker must not be empty".into(),
        ));
    }
    Ok(())
}
