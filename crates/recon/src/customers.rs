//! Customer cleaning and validation.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dates::parse_date_cell;
use crate::error::ReconError;
use crate::model::{
    output_columns, CleanOptions, CleanReport, Cleaned, Customer, Customers, Dataset, CUSTOMER_ID,
    CUSTOMER_KNOWN, CUSTOMER_REQUIRED, EMAIL, EMAIL_VALID, SIGNUP_DATE, SIGNUP_DATE_VALID,
};
use crate::normalize::{find_duplicates, normalize_key, normalize_str};
use crate::table::Table;

/// `local@domain.tld`: something before the `@`, something between it and a
/// dot, something after. Anchored at the start only.
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@]+@[^@]+\.[^@]+").expect("email pattern is a valid regex")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Clean then validate with default options (day-first dates).
pub fn clean_and_validate_customers(raw: &Table) -> Result<Cleaned<Customers>, ReconError> {
    clean_and_validate_customers_with(raw, &CleanOptions::default())
}

pub fn clean_and_validate_customers_with(
    raw: &Table,
    options: &CleanOptions,
) -> Result<Cleaned<Customers>, ReconError> {
    let cleaned = clean_customers(raw, options)?;
    validate_customers(&cleaned.data)?;
    Ok(cleaned)
}

/// Drop rows without a key, normalize keys, reject duplicates, and flag
/// invalid emails and signup dates. Flagged rows are kept.
pub fn clean_customers(raw: &Table, options: &CleanOptions) -> Result<Cleaned<Customers>, ReconError> {
    let dataset = Dataset::Customers;
    check_input(raw, dataset, &CUSTOMER_REQUIRED)?;

    let idx = |name: &str| raw.column_index(name);
    let id_idx = idx(CUSTOMER_ID).unwrap_or_default();
    let email_idx = idx(EMAIL).unwrap_or_default();
    let date_idx = idx(SIGNUP_DATE).unwrap_or_default();
    let extra_idx = extra_indices(raw, &CUSTOMER_KNOWN);

    let mut rows = Vec::with_capacity(raw.len());
    for row in &raw.rows {
        if row[id_idx].is_null() {
            continue;
        }
        let email = row[email_idx].as_text();
        let signup_date = parse_date_cell(&row[date_idx], options.date_order);
        rows.push(Customer {
            customer_id: normalize_key(&row[id_idx]),
            email_valid: email.as_deref().is_some_and(is_valid_email),
            email,
            signup_date_valid: signup_date.is_some(),
            signup_date,
            extra: extra_idx.iter().map(|&i| row[i].clone()).collect(),
        });
    }

    let duplicates = find_duplicates(rows.iter().map(|c| c.customer_id.as_str()));
    if !duplicates.is_empty() {
        tracing::warn!(
            dataset = %dataset,
            duplicate_keys = duplicates.len(),
            "duplicate customer ids after normalization"
        );
        return Err(ReconError::DuplicateKey {
            dataset,
            column: CUSTOMER_ID.into(),
            duplicates,
        });
    }

    let mut invalid = BTreeMap::new();
    invalid.insert(EMAIL.to_string(), rows.iter().filter(|c| !c.email_valid).count());
    invalid.insert(
        SIGNUP_DATE.to_string(),
        rows.iter().filter(|c| !c.signup_date_valid).count(),
    );

    let report = CleanReport {
        dataset,
        input_rows: raw.len(),
        dropped_missing_key: raw.len() - rows.len(),
        output_rows: rows.len(),
        invalid,
    };
    tracing::info!(
        dataset = %dataset,
        input_rows = report.input_rows,
        dropped = report.dropped_missing_key,
        output_rows = report.output_rows,
        "cleaned customers"
    );

    Ok(Cleaned {
        data: Customers {
            columns: output_columns(&raw.columns, &[EMAIL_VALID, SIGNUP_DATE_VALID]),
            rows,
        },
        report,
    })
}

/// Gate a cleaned row-set: it must be non-empty with unique normalized keys.
pub fn validate_customers(customers: &Customers) -> Result<(), ReconError> {
    let dataset = Dataset::Customers;
    if customers.is_empty() {
        return Err(ReconError::EmptyDataset { dataset });
    }
    let keys: Vec<String> = customers.rows.iter().map(|c| normalize_str(&c.customer_id)).collect();
    let duplicates = find_duplicates(keys.iter().map(String::as_str));
    if !duplicates.is_empty() {
        return Err(ReconError::DuplicateKey {
            dataset,
            column: CUSTOMER_ID.into(),
            duplicates,
        });
    }
    Ok(())
}

/// Shape and required-column checks shared by both cleaners.
pub(crate) fn check_input(raw: &Table, dataset: Dataset, required: &[&str]) -> Result<(), ReconError> {
    if let Some(message) = raw.shape_error() {
        return Err(ReconError::InvalidType { dataset, message });
    }
    let columns = raw.missing_columns(required);
    if !columns.is_empty() {
        return Err(ReconError::MissingColumns { dataset, columns });
    }
    Ok(())
}

/// Positions of the columns without a typed field, in table order.
pub(crate) fn extra_indices(raw: &Table, known: &[&str]) -> Vec<usize> {
    raw.columns
        .iter()
        .enumerate()
        .filter(|(_, c)| !known.contains(&c.as_str()))
        .map(|(i, _)| i)
        .collect()
}
