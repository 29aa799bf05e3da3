use std::collections::HashSet;
use std::fmt;

use serde::{Serialize, Serializer};

/// Tokens read as a missing value, matching what spreadsheet and dataframe
/// exports commonly write for an empty cell.
const NULL_TOKENS: &[&str] = &["NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "#N/A"];

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// A raw, untyped cell. Parsed input is `Null` or `Text`; `Number` comes
/// from typed values laid back out as cells.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Read a raw text field.
    ///
    /// Empty, whitespace-only and null tokens become `Null`; everything else
    /// stays `Text` with its original spelling. Numeric coercion is left to
    /// the cleaners so identifiers keep every digit.
    pub fn infer(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() || NULL_TOKENS.contains(&trimmed) {
            return Cell::Null;
        }
        Cell::Text(raw.to_string())
    }

    pub fn text(s: impl Into<String>) -> Cell {
        Cell::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Text content, or `None` for `Null`. Numbers render in their shortest form.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    /// `Null` renders empty, `Number(1.0)` renders `1`, `Number(1.5)` renders `1.5`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Text(if b { "true" } else { "false" }.to_string())
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Null)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Named columns plus ordered rows of cells.
///
/// Shape is not enforced on construction; [`Table::shape_error`] reports the
/// first problem so cleaners can reject malformed input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// Build a table from text rows, inferring every cell.
    pub fn from_text_rows<C, R, F>(columns: &[C], rows: R) -> Self
    where
        C: AsRef<str>,
        R: IntoIterator,
        R::Item: IntoIterator<Item = F>,
        F: AsRef<str>,
    {
        Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|f| Cell::infer(f.as_ref())).collect())
                .collect(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Required columns absent from this table, sorted.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        let mut missing: Vec<String> = required
            .iter()
            .filter(|name| self.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect();
        missing.sort();
        missing
    }

    /// Iterate one column's cells. Returns `None` if the column doesn't exist.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Cell> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row.get(idx).unwrap_or(&Cell::Null)))
    }

    /// Describe the first structural problem: a blank or repeated header, or a
    /// row whose width differs from the header.
    pub fn shape_error(&self) -> Option<String> {
        let mut seen = HashSet::new();
        for (i, name) in self.columns.iter().enumerate() {
            if name.trim().is_empty() {
                return Some(format!("column {} has an empty name", i + 1));
            }
            if !seen.insert(name.as_str()) {
                return Some(format!("column '{name}' appears more than once"));
            }
        }
        self.rows
            .iter()
            .position(|row| row.len() != self.columns.len())
            .map(|i| {
                format!(
                    "row {} has {} fields, expected {}",
                    i + 1,
                    self.rows[i].len(),
                    self.columns.len()
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_classifies_cells() {
        assert_eq!(Cell::infer(""), Cell::Null);
        assert_eq!(Cell::infer("   "), Cell::Null);
        assert_eq!(Cell::infer("NaN"), Cell::Null);
        assert_eq!(Cell::infer("abc"), Cell::Text("abc".into()));
        assert_eq!(Cell::infer(" 1.5 "), Cell::Text(" 1.5 ".into()));
    }

    #[test]
    fn infer_keeps_numeric_spelling() {
        assert_eq!(Cell::infer("12345678901234567890").to_string(), "12345678901234567890");
        assert_eq!(Cell::infer("007").to_string(), "007");
        assert_eq!(Cell::infer("1e3").to_string(), "1e3");
    }

    #[test]
    fn numbers_render_shortest() {
        assert_eq!(Cell::Number(1.0).to_string(), "1");
        assert_eq!(Cell::Number(10.25).to_string(), "10.25");
        assert_eq!(Cell::Null.to_string(), "");
        assert_eq!(Cell::Null.as_text(), None);
    }

    #[test]
    fn missing_columns_sorted() {
        let table = Table::new(vec!["email".into()]);
        assert_eq!(
            table.missing_columns(&["signup_date", "customer_id", "email"]),
            vec!["customer_id".to_string(), "signup_date".to_string()]
        );
    }

    #[test]
    fn shape_error_reports_ragged_row() {
        let mut table = Table::new(vec!["a".into(), "b".into()]);
        table.push_row(vec![Cell::Null, Cell::Null]);
        assert!(table.shape_error().is_none());
        table.push_row(vec![Cell::Null]);
        assert_eq!(table.shape_error().unwrap(), "row 2 has 1 fields, expected 2");
    }

    #[test]
    fn shape_error_reports_duplicate_header() {
        let table = Table::new(vec!["a".into(), "a".into()]);
        assert!(table.shape_error().unwrap().contains("more than once"));
    }

    #[test]
    fn column_iterates_cells() {
        let table = Table::from_text_rows(&["id", "name"], [["1", "a"], ["2", ""]]);
        let names: Vec<&Cell> = table.column("name").unwrap().collect();
        assert_eq!(names, vec![&Cell::Text("a".into()), &Cell::Null]);
        assert!(table.column("missing").is_none());
    }
}
