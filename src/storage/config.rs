//! Configuration management

use crate::error::{MflixError, Result};
use crate::types::Config;
use crate::utils::paths::{ensure_dir, get_config_dir, get_config_path};
use std::path::Path;
use tokio::fs;
use tokio::process::Command;

/// Load configuration from file; missing fields take their defaults
pub async fn load_config() -> Result<Config> {
    let config_path = get_config_path();

    if !Path::new(&config_path).exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path).await?;
    let config = parse_config(&content)?;
    tracing::debug!(path = %config_path, "config loaded");
    Ok(config)
}

/// Parse and validate a config document
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = serde_json::from_str(content)?;

    if config.history_capacity == 0 {
        return Err(MflixError::InvalidConfig(
            "history_capacity must be at least 1".into(),
        ));
    }
    if config.save_interval_secs == 0 {
        return Err(MflixError::InvalidConfig(
            "save_interval_secs must be at least 1".into(),
        ));
    }
    if !(0.0..=100.0).contains(&config.completed_percent) {
        return Err(MflixError::InvalidConfig(
            "completed_percent must be between 0 and 100".into(),
        ));
    }

    Ok(config)
}

/// Save configuration to file
pub async fn save_config(config: &Config) -> Result<()> {
    ensure_dir(&get_config_dir()).await?;
    let content = serde_json::to_string_pretty(config)?;
    fs::write(get_config_path(), content).await?;
    Ok(())
}

/// Open config file in editor
pub async fn edit_config(editor: &str) -> Result<()> {
    let config_path = get_config_path();

    // Ensure config file exists
    if !Path::new(&config_path).exists() {
        save_config(&Config::default()).await?;
    }

    Command::new(editor)
        .arg(&config_path)
        .status()
        .await
        .map_err(|e| MflixError::Spawn(format!("Failed to start {}: {}", editor, e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default_config() {
        assert_eq!(parse_config("{}").unwrap(), Config::default());
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = parse_config(r#"{"history_capacity": 0}"#).unwrap_err();
        assert!(matches!(err, MflixError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_out_of_range_completion() {
        assert!(parse_config(r#"{"completed_percent": 120.0}"#).is_err());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(parse_config("{"), Err(MflixError::Json(_))));
    }
}
