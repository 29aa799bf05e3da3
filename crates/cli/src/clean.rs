//! `tally clean customers|orders`: one dataset through the cleaner and validator.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use tally_recon::{
    clean_and_validate_customers_with, clean_and_validate_orders_with, CleanOptions, CleanReport,
    DateOrder, ReconError, Table,
};

use crate::exit_codes::EXIT_IO;
use crate::CliError;

#[derive(Subcommand)]
pub enum CleanCommands {
    /// Clean a customers export (customer_id, email, signup_date)
    Customers(CleanArgs),
    /// Clean an orders export (order_id, customer_id, amount, order_date)
    Orders(CleanArgs),
}

#[derive(Args)]
pub struct CleanArgs {
    /// Input CSV
    file: PathBuf,

    /// Write the cleaned CSV here instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Print the clean report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Read ambiguous dates as month/day/year
    #[arg(long)]
    month_first: bool,
}

pub fn cmd_clean(cmd: CleanCommands) -> Result<(), CliError> {
    match cmd {
        CleanCommands::Customers(args) => run_clean(args, |raw, options| {
            let cleaned = clean_and_validate_customers_with(raw, options)?;
            Ok((cleaned.data.to_table(), cleaned.report))
        }),
        CleanCommands::Orders(args) => run_clean(args, |raw, options| {
            let cleaned = clean_and_validate_orders_with(raw, options)?;
            Ok((cleaned.data.to_table(), cleaned.report))
        }),
    }
}

fn run_clean(
    args: CleanArgs,
    clean: impl Fn(&Table, &CleanOptions) -> Result<(Table, CleanReport), ReconError>,
) -> Result<(), CliError> {
    let options = CleanOptions {
        date_order: if args.month_first { DateOrder::MonthFirst } else { DateOrder::DayFirst },
    };
    let raw = tally_io::csv::import(&args.file)?;
    let (table, report) = clean(&raw, &options)?;

    match &args.output {
        Some(path) => {
            tally_io::csv::export(&table, path)?;
            eprintln!("wrote {}", path.display());
        }
        None if !args.json => {
            tally_io::csv::write_table(&table, std::io::stdout().lock())?;
        }
        None => {}
    }

    if args.json {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::new(EXIT_IO, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    eprintln!(
        "{}: {} rows in, {} dropped without key, {} out",
        report.dataset, report.input_rows, report.dropped_missing_key, report.output_rows,
    );
    for (column, count) in report.invalid.iter().filter(|(_, n)| **n > 0) {
        eprintln!("  {count} row(s) with invalid {column} (kept, flagged)");
    }
    Ok(())
}
