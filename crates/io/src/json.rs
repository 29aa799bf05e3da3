// JSON record rendering

use std::io::Write;

use serde_json::{Map, Value};
use tally_recon::Table;

/// One JSON object per row, every value a string. Nulls render as `""`.
pub fn records(table: &Table) -> Vec<Map<String, Value>> {
    table
        .rows
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .zip(row)
                .map(|(name, cell)| (name.clone(), Value::String(cell.to_string())))
                .collect()
        })
        .collect()
}

/// Pretty-printed `[ {..}, .. ]`.
pub fn write_records<W: Write>(table: &Table, out: W) -> Result<(), crate::IoError> {
    serde_json::to_writer_pretty(out, &records(table))?;
    Ok(())
}
