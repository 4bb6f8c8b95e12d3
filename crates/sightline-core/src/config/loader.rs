use super::schema::EngineConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0} must be at least 1")]
    ZeroLimit(&'static str),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./sightline.yaml
    /// 2. ~/.sightline/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<EngineConfig, ConfigError> {
        let local_config = PathBuf::from("./sightline.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".sightline").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        debug!("No config file found, using defaults");
        Ok(EngineConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<EngineConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: EngineConfig = serde_yaml::from_str(&content)?;
        validate(&config)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }
}

/// A zero search depth would yield only bare tag selectors, a zero tracker
/// capacity would forget every insertion, and a zero text limit would drop
/// every text locator.
pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    let limits = [
        ("synthesis.max_depth", config.synthesis.max_depth),
        ("tracker.capacity", config.tracker.capacity),
        ("composer.max_text_length", config.composer.max_text_length),
    ];
    match limits.iter().find(|(_, value)| *value == 0) {
        Some((name, _)) => Err(ConfigError::ZeroLimit(name)),
        None => Ok(()),
    }
}
