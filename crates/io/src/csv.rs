// CSV/TSV import/export for tables

use std::io::Write;
use std::path::Path;

use tally_recon::{Cell, Table};

use crate::error::IoError;

pub fn import(path: &Path) -> Result<Table, IoError> {
    let content = read_file_as_utf8(path)?;
    let table = parse_str(&content)?;
    tracing::debug!(path = %path.display(), rows = table.len(), "imported csv");
    Ok(table)
}

pub fn import_with_delimiter(path: &Path, delimiter: u8) -> Result<Table, IoError> {
    let content = read_file_as_utf8(path)?;
    parse_with_delimiter(&content, delimiter)
}

/// Parse uploaded bytes: decode, sniff the delimiter, infer cells.
pub fn parse_bytes(bytes: Vec<u8>) -> Result<Table, IoError> {
    parse_str(&decode_utf8(bytes))
}

pub fn parse_str(content: &str) -> Result<Table, IoError> {
    parse_with_delimiter(content, sniff_delimiter(content))
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().filter(|l| !l.is_empty()).take(10).collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines.iter().map(|line| field_count(line, delim)).collect();

        // Must split the header line to be viable
        let Some(&target) = counts.first() else { break };
        if target <= 1 {
            continue;
        }

        // Ties go to the wider split
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map(|r| r.len())
        .unwrap_or(1)
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let bytes = std::fs::read(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decode_utf8(bytes))
}

/// UTF-8 if valid (BOM stripped), otherwise Windows-1252 as Excel exports it.
pub fn decode_utf8(bytes: Vec<u8>) -> String {
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            tracing::debug!("input is not UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// First record is the header. Ragged rows are kept as-is so the cleaners can
/// reject them with a dataset-specific error.
fn parse_with_delimiter(content: &str, delimiter: u8) -> Result<Table, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Err(IoError::EmptyInput),
    };
    let mut table = Table::new(header.iter().map(|h| h.trim().to_string()).collect());

    for result in records {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        table.push_row(record.iter().map(Cell::infer).collect());
    }

    Ok(table)
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

pub fn export(table: &Table, path: &Path) -> Result<(), IoError> {
    let file = std::fs::File::create(path).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    write_table(table, file)
}

pub fn to_csv_string(table: &Table) -> Result<String, IoError> {
    let mut buf = Vec::new();
    write_table(table, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Header then rows. Nulls render as empty fields.
pub fn write_table<W: Write>(table: &Table, out: W) -> Result<(), IoError> {
    let mut writer = csv::WriterBuilder::new().from_writer(out);
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|c| c.to_string()))?;
    }
    writer.flush().map_err(|e| IoError::Csv(e.into()))?;
    Ok(())
}
