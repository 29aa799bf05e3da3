use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// A log level, format or filter that doesn't parse.
    #[error("invalid logging option: {0}")]
    InvalidLogOption(String),

    #[error("logging already initialized: {0}")]
    LoggingInit(String),
}
