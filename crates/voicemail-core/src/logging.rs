//! Tracing subscriber for processes hosting voicemail sessions
//!
//! Session logs are emitted under this crate's target, inside a
//! `voicemail_session` span carrying `session_id`, `domain` and `mailbox`.
//! Most hosts call [`VoicemailConfig::init_logging`](crate::config::VoicemailConfig::init_logging)
//! rather than building a [`LoggingConfig`] by hand.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::errors::{Result, VoicemailError};

/// Target the session machine logs under
pub const LOG_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per line, session span fields included
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level for voicemail session logs
    pub level: Level,
    pub format: LogFormat,
    pub file_info: bool,
    /// Log when a session span opens and closes, i.e. when a call leg starts and ends
    pub session_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Text,
            file_info: false,
            session_spans: false,
        }
    }
}

impl LoggingConfig {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    pub fn with_session_spans(mut self) -> Self {
        self.session_spans = true;
        self
    }

    /// `RUST_LOG` directives plus `level` for this crate's target.
    pub fn env_filter(&self) -> EnvFilter {
        let directive = format!("{}={}", LOG_TARGET, self.level);
        match directive.parse() {
            Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
            Err(_) => EnvFilter::from_default_env(),
        }
    }
}

/// Install a global subscriber for `config`.
///
/// Returns `Config` if a global subscriber is already installed.
pub fn setup_logging(config: &LoggingConfig) -> Result<()> {
    let span_events = if config.session_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(config.env_filter())
        .with_span_events(span_events)
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    installed.map_err(|e| VoicemailError::config(format!("Failed to set up logging: {}", e)))?;

    tracing::info!(
        target: LOG_TARGET,
        "Voicemail logging at {} ({:?})",
        config.level,
        config.format
    );
    Ok(())
}

pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level.trim())
        .map_err(|_| VoicemailError::config(format!("Invalid log level: {}", level)))
}
