//! Logging configuration and initialization.
//!
//! Every binary calls [`init_logging`] once at startup. Level and format come
//! from the `[log]` table of the settings file, then environment overrides:
//!
//! - `TALLY_LOG_LEVEL`: trace, debug, info, warn, error
//! - `TALLY_LOG_FORMAT`: text, json
//! - `TALLY_LOG_FILTER`: extra directives, e.g. `tower_http=debug`
//! - `RUST_LOG`: read by the env filter as usual

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogOption(format!("log level '{s}'"))),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidLogOption(format!("log format '{s}'"))),
        }
    }
}

/// Where log lines go. The CLI keeps stdout for its JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogWriter {
    #[default]
    Stderr,
    Stdout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Extra directives, comma separated (e.g. "tally_recon=debug,tower_http=info").
    pub filter_directives: Option<String>,
    #[serde(skip)]
    pub writer: LogWriter,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
            filter_directives: None,
            writer: LogWriter::Stderr,
        }
    }
}

impl LogConfig {
    /// Apply `TALLY_LOG_*` variables from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(level) = lookup("TALLY_LOG_LEVEL") {
            self.level = level.parse()?;
        }
        if let Some(format) = lookup("TALLY_LOG_FORMAT") {
            self.format = format.parse()?;
        }
        if let Some(filter) = lookup("TALLY_LOG_FILTER") {
            self.filter_directives = Some(filter);
        }
        Ok(self)
    }

    pub fn writer(mut self, writer: LogWriter) -> Self {
        self.writer = writer;
        self
    }

    /// Base level plus `RUST_LOG` plus the configured directives.
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        let mut filter =
            EnvFilter::from_default_env().add_directive(self.level.to_tracing_level().into());
        if let Some(ref directives) = self.filter_directives {
            for directive in directives.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                let parsed = directive
                    .parse()
                    .map_err(|e| ConfigError::InvalidLogOption(format!("filter '{directive}': {e}")))?;
                filter = filter.add_directive(parsed);
            }
        }
        Ok(filter)
    }
}

/// Install the global subscriber. Call once per process.
pub fn init_logging(config: &LogConfig) -> Result<(), ConfigError> {
    let filter = config.env_filter()?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match (config.format, config.writer) {
        (LogFormat::Text, LogWriter::Stderr) => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        (LogFormat::Text, LogWriter::Stdout) => registry
            .with(fmt::layer().with_writer(std::io::stdout))
            .try_init(),
        (LogFormat::Json, LogWriter::Stderr) => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        (LogFormat::Json, LogWriter::Stdout) => registry
            .with(fmt::layer().json().with_writer(std::io::stdout))
            .try_init(),
    };
    result.map_err(|e| ConfigError::LoggingInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_overrides_win() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TALLY_LOG_LEVEL", "debug"),
            ("TALLY_LOG_FORMAT", "json"),
            ("TALLY_LOG_FILTER", "tower_http=warn"),
        ]);
        let config = LogConfig::default()
            .with_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.filter_directives.as_deref(), Some("tower_http=warn"));
    }

    #[test]
    fn test_bad_override_is_an_error() {
        let err = LogConfig::default()
            .with_overrides(|k| (k == "TALLY_LOG_LEVEL").then(|| "chatty".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("chatty"));
    }
}
