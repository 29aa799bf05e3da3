// tally CLI - clean, validate and reconcile customer/order CSV exports

mod clean;
mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tally_config::{init_logging, LogLevel, LogWriter, Settings};
use tally_io::IoError;
use tally_recon::ReconError;

use exit_codes::{io_exit_code, recon_exit_code, EXIT_SETTINGS, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Clean, validate and reconcile customer and order exports")]
#[command(version)]
#[command(long_version = long_version())]
struct Cli {
    /// Debug-level logging on stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Settings file (default: <config dir>/tally/settings.toml)
    #[arg(long, global = true, env = "TALLY_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a reconciliation job and write its artifacts
    #[command(after_help = "\
Examples:
  tally run monthly.recon.toml
  tally run monthly.recon.toml --json
  tally run monthly.recon.toml --output-dir /tmp/out")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Print the run report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Override the config's [output] dir
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  tally validate monthly.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },

    /// Clean and validate a single dataset
    #[command(after_help = "\
Examples:
  tally clean customers customers.csv -o clean_customers.csv
  tally clean orders orders.csv --json
  tally clean orders orders.csv --month-first > clean_orders.csv")]
    Clean {
        #[command(subcommand)]
        dataset: clean::CleanCommands,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("TALLY_COMMIT"), ")",
        "\nengine:  tally-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TALLY_TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(&cli) {
        return report(e);
    }

    let result = match cli.command {
        Commands::Run { config, json, output_dir } => recon::cmd_run(config, json, output_dir),
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Clean { dataset } => clean::cmd_clean(dataset),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => report(e),
    }
}

fn report(CliError { code, message, hint }: CliError) -> ExitCode {
    if !message.is_empty() {
        eprintln!("error: {}", message);
    }
    if let Some(hint) = hint {
        eprintln!("hint:  {}", hint);
    }
    ExitCode::from(code)
}

/// Settings file, then TALLY_LOG_* overrides, then `--verbose`. Logs go to
/// stderr so stdout stays machine-readable.
fn setup_logging(cli: &Cli) -> Result<(), CliError> {
    let settings = match &cli.settings {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| CliError::new(EXIT_SETTINGS, e.to_string()))?;

    let mut log = settings
        .log
        .with_env_overrides()
        .map_err(|e| CliError::new(EXIT_SETTINGS, e.to_string()))?
        .writer(LogWriter::Stderr);
    if cli.verbose {
        log.level = LogLevel::Debug;
    }
    init_logging(&log).map_err(|e| CliError::new(EXIT_SETTINGS, e.to_string()))
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::MissingColumns { dataset, .. } => {
                Some(format!("is this really the {dataset} export? check the header row"))
            }
            ReconError::DuplicateKey { .. } => Some(
                "ids are compared trimmed and lowercased, with a trailing \".0\" removed".to_string(),
            ),
            ReconError::InvalidType { .. } => {
                Some("every row needs the same number of fields as the header".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        Self::new(io_exit_code(&err), err.to_string())
    }
}
