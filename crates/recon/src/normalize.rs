use std::collections::HashMap;

use crate::error::DuplicateEntry;
use crate::table::Cell;

/// Placeholder key for a missing value. Callers drop null keys before
/// normalizing, so this only shows up when they don't.
pub const NULL_KEY: &str = "nan";

/// Canonical string form of an identifier.
///
/// Surrounding whitespace, one trailing `".0"` (a numeric-coercion artifact)
/// and case are removed, so `"12"`, `"12.0"`, `" 12 "` compare equal and so do
/// `"ABC"`/`"abc"`. Digits are never reinterpreted: `"007"` and `"7"` stay
/// distinct, as do long ids past float precision.
pub fn normalize_key(cell: &Cell) -> String {
    match cell {
        Cell::Null => NULL_KEY.to_string(),
        other => normalize_str(&other.to_string()),
    }
}

/// [`normalize_key`] for text already pulled out of a cell.
pub fn normalize_str(raw: &str) -> String {
    let s = raw.trim();
    let s = s.strip_suffix(".0").unwrap_or(s).trim_end();
    s.to_lowercase()
}

/// Normalize every cell of a column.
pub fn normalize_column<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Vec<String> {
    cells.into_iter().map(normalize_key).collect()
}

/// Keys that occur more than once, in order of first occurrence.
pub fn find_duplicates<'a>(keys: impl IntoIterator<Item = &'a str>) -> Vec<DuplicateEntry> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();
    for key in keys {
        let count = counts.entry(key).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }
    order
        .into_iter()
        .filter_map(|key| {
            let count = counts[key];
            (count > 1).then(|| DuplicateEntry { key: key.to_string(), count })
        })
        .collect()
}
