// Configuration loading

pub mod error;
pub mod logging;
pub mod settings;

pub use error::ConfigError;
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel, LogWriter};
pub use settings::{ServerSettings, Settings};
