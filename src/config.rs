//! Configuration management for sharectl

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default log level when RUST_LOG is not set
    pub log_level: String,

    /// Relaunch elevated automatically when a mutating operation is invoked
    /// from a non-elevated process
    pub auto_elevate: bool,

    /// Pass `/English` to the feature enumeration so the status parser sees
    /// untranslated tokens
    pub english_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            auto_elevate: true,
            english_output: true,
        }
    }
}

impl Config {
    /// Defaults with SHARECTL_* environment overrides applied
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(level) = env::var("SHARECTL_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Ok(value) = env::var("SHARECTL_AUTO_ELEVATE") {
            if let Ok(parsed) = value.parse::<bool>() {
                config.auto_elevate = parsed;
            }
        }
        if let Ok(value) = env::var("SHARECTL_ENGLISH_OUTPUT") {
            if let Ok(parsed) = value.parse::<bool>() {
                config.english_output = parsed;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert!(config.auto_elevate);
        assert!(config.english_output);
    }
}
