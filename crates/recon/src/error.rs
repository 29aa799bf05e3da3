use serde::Serialize;
use thiserror::Error;

use crate::model::Dataset;

/// A key that occurs more than once, with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateEntry {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Error)]
pub enum ReconError {
    /// Required columns absent from the input table.
    #[error("{dataset}: missing required columns: {}", .columns.join(", "))]
    MissingColumns { dataset: Dataset, columns: Vec<String> },

    /// No rows left after cleaning.
    #[error("{dataset} dataset is empty")]
    EmptyDataset { dataset: Dataset },

    /// An identifier repeats after cleaning.
    #[error("{dataset}: duplicate {column} values: {}", format_duplicates(.duplicates))]
    DuplicateKey {
        dataset: Dataset,
        column: String,
        duplicates: Vec<DuplicateEntry>,
    },

    /// Input is not a well-formed table.
    #[error("{dataset}: malformed table: {message}")]
    InvalidType { dataset: Dataset, message: String },

    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (empty name, missing file, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
}

impl ReconError {
    /// Stable machine-readable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingColumns { .. } => "missing_columns",
            Self::EmptyDataset { .. } => "empty_dataset",
            Self::DuplicateKey { .. } => "duplicate_key",
            Self::InvalidType { .. } => "invalid_type",
            Self::ConfigParse(_) => "config_parse",
            Self::ConfigValidation(_) => "config_validation",
        }
    }
}

fn format_duplicates(dups: &[DuplicateEntry]) -> String {
    dups.iter()
        .map(|d| format!("{:?} ({}x)", d.key, d.count))
        .collect::<Vec<_>>()
        .join(", ")
}
