//! `tally run` / `tally validate`: config-driven customer/order reconciliation.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tally_recon::{CleanReport, ReconConfig, ReconRun, ReconSummary, RunMeta};

use crate::exit_codes::{EXIT_IO, EXIT_ORPHANS};
use crate::CliError;

/// Stdout contract for `tally run --json`.
#[derive(Serialize)]
struct RunOutput<'a> {
    meta: &'a RunMeta,
    summary: &'a ReconSummary,
    clean: CleanReports<'a>,
    output_dir: String,
    artifacts: Vec<String>,
}

#[derive(Serialize)]
struct CleanReports<'a> {
    customers: &'a CleanReport,
    orders: &'a CleanReport,
}

fn load_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        CliError::new(EXIT_IO, format!("cannot read config {}: {e}", config_path.display()))
    })?;
    Ok(ReconConfig::from_toml(&config_str)?)
}

/// Relative paths in the config resolve against its directory.
fn base_dir(config_path: &Path) -> &Path {
    match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

pub fn cmd_run(config_path: PathBuf, json_output: bool, output_dir: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let base = base_dir(&config_path);

    let customers = tally_io::csv::import(&config.customers_path(base))?;
    let orders = tally_io::csv::import(&config.orders_path(base))?;

    let result = tally_recon::run(&config, &customers, &orders)?;

    let out_dir = output_dir.unwrap_or_else(|| config.output_dir(base));
    let written = tally_io::artifacts::write_run(&result, &out_dir)
        .map_err(|e| CliError::from(e).with_hint("check that the output directory is writable"))?;

    if json_output {
        let output = RunOutput {
            meta: &result.meta,
            summary: &result.report.summary,
            clean: CleanReports {
                customers: &result.customers.report,
                orders: &result.orders.report,
            },
            output_dir: out_dir.display().to_string(),
            artifacts: written.iter().map(|p| p.display().to_string()).collect(),
        };
        let json_str = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::new(EXIT_IO, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    print_summary(&result);
    eprintln!("wrote {} file(s) to {}", written.len(), out_dir.display());

    if result.report.summary.has_orphans() {
        // Exit status alone carries the verdict
        return Err(CliError::new(EXIT_ORPHANS, ""));
    }
    Ok(())
}

/// Human summary to stderr
fn print_summary(result: &ReconRun) {
    let s = &result.report.summary;
    for report in [&result.customers.report, &result.orders.report] {
        let invalid: Vec<String> = report
            .invalid
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(column, n)| format!("{n} invalid {column}"))
            .collect();
        eprintln!(
            "{}: {} rows, {} dropped without key{}",
            report.dataset,
            report.output_rows,
            report.dropped_missing_key,
            if invalid.is_empty() { String::new() } else { format!(", {}", invalid.join(", ")) },
        );
    }
    eprintln!(
        "recon '{}': {} customers, {} orders, {} orders without customers, {} customers without orders",
        result.meta.config_name,
        s.total_customers,
        s.total_orders,
        s.orders_without_customers_count,
        s.customers_without_orders_count,
    );
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let base = base_dir(&config_path);
    eprintln!(
        "valid: recon '{}' ({} vs {}, {} dates) -> {}",
        config.name,
        config.customers_path(base).display(),
        config.orders_path(base).display(),
        match config.dates.order {
            tally_recon::DateOrder::DayFirst => "day-first",
            tally_recon::DateOrder::MonthFirst => "month-first",
        },
        config.output_dir(base).display(),
    );
    Ok(())
}
