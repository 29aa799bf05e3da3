use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dates::DateOrder;
use crate::error::ReconError;
use crate::model::CleanOptions;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// A reconciliation job, read from a `*.recon.toml` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    pub name: String,
    pub customers: SourceConfig,
    pub orders: SourceConfig,
    #[serde(default)]
    pub dates: DateConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// CSV path, relative to the config file's directory unless absolute.
    pub file: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateConfig {
    #[serde(default)]
    pub order: DateOrder,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    /// Also write `combined.csv`.
    #[serde(default = "default_combined")]
    pub combined: bool,
}

fn default_output_dir() -> String {
    "output".into()
}

fn default_combined() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            combined: default_combined(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }
        for (section, source) in [("customers", &self.customers), ("orders", &self.orders)] {
            if source.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "[{section}] file must not be empty"
                )));
            }
        }
        if self.output.dir.trim().is_empty() {
            return Err(ReconError::ConfigValidation("[output] dir must not be empty".into()));
        }
        Ok(())
    }

    pub fn clean_options(&self) -> CleanOptions {
        CleanOptions { date_order: self.dates.order }
    }

    pub fn customers_path(&self, base: &Path) -> PathBuf {
        resolve(base, &self.customers.file)
    }

    pub fn orders_path(&self, base: &Path) -> PathBuf {
        resolve(base, &self.orders.file)
    }

    pub fn output_dir(&self, base: &Path) -> PathBuf {
        resolve(base, &self.output.dir)
    }
}

fn resolve(base: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
