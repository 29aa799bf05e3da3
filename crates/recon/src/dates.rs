use chrono::{Datelike, DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::table::Cell;

/// How to read ambiguous numeric dates such as `03/04/2023`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `03/04/2023` is 3 April.
    #[default]
    DayFirst,
    /// `03/04/2023` is 4 March.
    MonthFirst,
}

/// Unambiguous forms, tried before the order-dependent ones.
const ISO_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

const NAMED_MONTH_FORMATS: &[&str] = &["%d %b %Y", "%d %B %Y", "%b %d, %Y", "%B %d, %Y", "%d-%b-%Y"];

const DAY_FIRST_FORMATS: &[&str] = &[
    "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%d/%m/%y", "%d-%m-%y", "%d.%m.%y",
];

const MONTH_FIRST_FORMATS: &[&str] = &[
    "%m/%d/%Y", "%m-%d-%Y", "%m.%d.%Y", "%m/%d/%y", "%m-%d-%y", "%m.%d.%y",
];

impl DateOrder {
    fn numeric_formats(self) -> &'static [&'static str] {
        match self {
            Self::DayFirst => DAY_FIRST_FORMATS,
            Self::MonthFirst => MONTH_FIRST_FORMATS,
        }
    }
}

/// Parse a cell as a calendar date. Null and unparseable values give `None`.
pub fn parse_date_cell(cell: &Cell, order: DateOrder) -> Option<NaiveDate> {
    match cell {
        Cell::Null => None,
        Cell::Text(s) => parse_date(s, order),
        Cell::Number(_) => parse_date(&cell.to_string(), order),
    }
}

/// Parse a date string. ISO forms win regardless of `order`; a trailing time
/// component is accepted on the day/month forms and discarded.
pub fn parse_date(raw: &str, order: DateOrder) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(d) = try_formats(s, ISO_FORMATS) {
        return Some(d);
    }
    for fmt in ISO_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Some(d) = try_formats(s, NAMED_MONTH_FORMATS) {
        return Some(d);
    }

    let date_part = s.split_whitespace().next().unwrap_or(s);
    if date_part != s && !looks_like_time(&s[date_part.len()..]) {
        return None;
    }
    try_formats(date_part, order.numeric_formats())
}

fn try_formats(s: &str, formats: &[&str]) -> Option<NaiveDate> {
    formats.iter().find_map(|fmt| {
        let d = NaiveDate::parse_from_str(s, fmt).ok()?;
        // `%Y` happily reads "23" as year 23; leave short years to `%y`.
        if fmt.contains("%Y") && d.year_ce().1 < 1000 {
            return None;
        }
        Some(d)
    })
}

fn looks_like_time(rest: &str) -> bool {
    let rest = rest.trim();
    ["%H:%M:%S", "%H:%M", "%H:%M:%S%.f"]
        .iter()
        .any(|fmt| NaiveTime::parse_from_str(rest, fmt).is_ok())
}
