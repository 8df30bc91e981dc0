use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    pub logging: Option<LoggingConfig>,
}

/// Retry policy for the per-room reconnect supervisor.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReconnectConfig {
    /// Fixed delay between retry attempts, in seconds.
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
    /// Maximum attempts per arm cycle. Zero means unlimited.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub filters: Option<String>,
}

fn default_backoff_secs() -> u64 {
    5
}

fn default_max_attempts() -> u32 {
    10
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            backoff_secs: default_backoff_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to
    /// defaults when the file is missing or empty.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_str = std::fs::read_to_string("config.toml").unwrap_or_else(|_| "".to_string());
        if config_str.is_empty() {
            return Ok(Self::default());
        }
        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_sections() {
        let config: Config = toml::from_str("").expect("empty config should parse");
        assert_eq!(config.reconnect.backoff_secs, 5);
        assert_eq!(config.reconnect.max_attempts, 10);
        assert!(config.logging.is_none());
    }

    #[test]
    fn partial_reconnect_section_keeps_other_defaults() {
        let config: Config = toml::from_str("[reconnect]\nmax_attempts = 3\n").unwrap();
        assert_eq!(config.reconnect.max_attempts, 3);
        assert_eq!(config.reconnect.backoff_secs, 5);
    }
}
