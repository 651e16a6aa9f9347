//! Configuration for voicemail sessions
//!
//! Loaded from TOML, with a couple of environment overrides:
//!
//! ```toml
//! grammar_path = "/etc/voicemail/grammar.yaml"
//! event_capacity = 64
//! history_limit = 32
//! log_level = "debug"
//! log_format = "json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{Result, VoicemailError};
use crate::logging::{parse_log_level, setup_logging, LogFormat, LoggingConfig};

/// Environment variable naming a grammar file to use instead of the configured one
pub const GRAMMAR_ENV_VAR: &str = "VOICEMAIL_GRAMMAR";
/// Environment variable overriding `log_level`
pub const LOG_LEVEL_ENV_VAR: &str = "VOICEMAIL_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoicemailConfig {
    /// YAML grammar file; the embedded default grammar is used when unset
    pub grammar_path: Option<PathBuf>,
    /// Capacity of each session's event broadcast channel
    pub event_capacity: usize,
    /// Number of transitions kept in each session's history
    pub history_limit: usize,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for VoicemailConfig {
    fn default() -> Self {
        Self {
            grammar_path: None,
            event_capacity: 64,
            history_limit: 32,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl VoicemailConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            VoicemailError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Apply `VOICEMAIL_GRAMMAR` and `VOICEMAIL_LOG_LEVEL` on top of this config.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var(GRAMMAR_ENV_VAR) {
            if !path.is_empty() {
                tracing::info!("Grammar path overridden by {}: {}", GRAMMAR_ENV_VAR, path);
                self.grammar_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(level) = std::env::var(LOG_LEVEL_ENV_VAR) {
            if parse_log_level(&level).is_ok() {
                self.log_level = level;
            } else {
                tracing::warn!("Ignoring invalid {}: {}", LOG_LEVEL_ENV_VAR, level);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(VoicemailError::config("event_capacity must be at least 1"));
        }
        parse_log_level(&self.log_level)?;
        Ok(())
    }

    /// Logging setup matching `log_level` and `log_format`.
    pub fn logging_config(&self) -> Result<LoggingConfig> {
        Ok(LoggingConfig::new(parse_log_level(&self.log_level)?).with_format(self.log_format))
    }

    /// Install the global tracing subscriber described by this config.
    ///
    /// Call once per process, before starting sessions.
    pub fn init_logging(&self) -> Result<()> {
        setup_logging(&self.logging_config()?)
    }
}
