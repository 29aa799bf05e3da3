//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain     | Description                                  |
//! |---------|------------|----------------------------------------------|
//! | 0       | Universal  | Success                                      |
//! | 1       | run        | Reconciliation finished, orphans found       |
//! | 2       | Universal  | CLI usage error (bad args)                   |
//! | 3-9     | io         | Reading/writing files, settings              |
//! | 10-19   | data       | Dataset rejected by cleaning or validation   |
//! | 20-29   | config     | Recon job config problems                    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use tally_io::IoError;
use tally_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed, nothing to report.
pub const EXIT_SUCCESS: u8 = 0;

/// Reconciliation ran to completion but found orders without customers or
/// customers without orders. Like `diff(1)`, 1 means "sides differ".
pub const EXIT_ORPHANS: u8 = 1;

/// Usage error - bad arguments. clap exits with this itself.
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// IO (3-9)
// =============================================================================

/// Cannot read an input or write an output.
pub const EXIT_IO: u8 = 3;

/// Input is not parseable CSV (bad quoting, no header row).
pub const EXIT_CSV: u8 = 4;

/// User settings file is unreadable or invalid.
pub const EXIT_SETTINGS: u8 = 5;

// =============================================================================
// Data (10-19)
// =============================================================================

/// A required column is missing.
pub const EXIT_MISSING_COLUMNS: u8 = 10;

/// Nothing left after cleaning.
pub const EXIT_EMPTY_DATASET: u8 = 11;

/// An identifier repeats after normalization.
pub const EXIT_DUPLICATE_KEY: u8 = 12;

/// Table is malformed (ragged rows, blank or repeated header).
pub const EXIT_INVALID_TABLE: u8 = 13;

// =============================================================================
// Config (20-29)
// =============================================================================

/// Recon config is not valid TOML or has the wrong shape.
pub const EXIT_CONFIG_PARSE: u8 = 20;

/// Recon config parsed but failed validation.
pub const EXIT_CONFIG_INVALID: u8 = 21;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::MissingColumns { .. } => EXIT_MISSING_COLUMNS,
        ReconError::EmptyDataset { .. } => EXIT_EMPTY_DATASET,
        ReconError::DuplicateKey { .. } => EXIT_DUPLICATE_KEY,
        ReconError::InvalidType { .. } => EXIT_INVALID_TABLE,
        ReconError::ConfigParse(_) => EXIT_CONFIG_PARSE,
        ReconError::ConfigValidation(_) => EXIT_CONFIG_INVALID,
    }
}

/// Map an IO-layer error to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Read { .. } | IoError::Write { .. } | IoError::Json(_) => EXIT_IO,
        IoError::EmptyInput | IoError::Csv(_) => EXIT_CSV,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_recon::Dataset;

    #[test]
    fn every_recon_error_has_its_own_code() {
        let errors = [
            ReconError::MissingColumns { dataset: Dataset::Orders, columns: vec!["amount".into()] },
            ReconError::EmptyDataset { dataset: Dataset::Customers },
            ReconError::DuplicateKey {
                dataset: Dataset::Customers,
                column: "customer_id".into(),
                duplicates: vec![],
            },
            ReconError::InvalidType { dataset: Dataset::Orders, message: "ragged".into() },
            ReconError::ConfigParse("bad".into()),
            ReconError::ConfigValidation("bad".into()),
        ];
        let mut codes: Vec<u8> = errors.iter().map(recon_exit_code).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(!codes.contains(&EXIT_SUCCESS));
        assert!(!codes.contains(&EXIT_ORPHANS));
    }

    #[test]
    fn csv_problems_are_not_io_problems() {
        assert_eq!(io_exit_code(&IoError::EmptyInput), EXIT_CSV);
        let read = IoError::Read {
            path: "x.csv".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(io_exit_code(&read), EXIT_IO);
    }
}
