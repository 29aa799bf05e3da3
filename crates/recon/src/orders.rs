//! Order cleaning and validation.
//!
//! Unlike customers, the order identity is compared exactly as received; only
//! the customer foreign key is normalized.

use std::collections::BTreeMap;

use crate::customers::{check_input, extra_indices};
use crate::dates::parse_date_cell;
use crate::error::ReconError;
use crate::model::{
    output_columns, CleanOptions, CleanReport, Cleaned, Dataset, Order, Orders, AMOUNT,
    AMOUNT_VALID, CUSTOMER_ID, ORDER_DATE, ORDER_DATE_VALID, ORDER_ID, ORDER_KNOWN, ORDER_REQUIRED,
};
use crate::normalize::{find_duplicates, normalize_key};
use crate::table::{Cell, Table};

/// Coerce an amount cell to a finite number.
pub fn coerce_amount(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Null => return None,
        Cell::Number(n) => *n,
        Cell::Text(s) => s.trim().parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}

pub fn clean_and_validate_orders(raw: &Table) -> Result<Cleaned<Orders>, ReconError> {
    clean_and_validate_orders_with(raw, &CleanOptions::default())
}

pub fn clean_and_validate_orders_with(
    raw: &Table,
    options: &CleanOptions,
) -> Result<Cleaned<Orders>, ReconError> {
    let cleaned = clean_orders(raw, options)?;
    validate_orders(&cleaned.data)?;
    Ok(cleaned)
}

/// Drop rows missing either id, normalize the customer key, reject repeated
/// order ids, and coerce amount and order date with validity flags.
pub fn clean_orders(raw: &Table, options: &CleanOptions) -> Result<Cleaned<Orders>, ReconError> {
    let dataset = Dataset::Orders;
    check_input(raw, dataset, &ORDER_REQUIRED)?;

    let idx = |name: &str| raw.column_index(name).unwrap_or_default();
    let (order_idx, customer_idx) = (idx(ORDER_ID), idx(CUSTOMER_ID));
    let (amount_idx, date_idx) = (idx(AMOUNT), idx(ORDER_DATE));
    let extra_idx = extra_indices(raw, &ORDER_KNOWN);

    let mut rows = Vec::with_capacity(raw.len());
    for row in &raw.rows {
        if row[order_idx].is_null() || row[customer_idx].is_null() {
            continue;
        }
        let amount = coerce_amount(&row[amount_idx]);
        let order_date = parse_date_cell(&row[date_idx], options.date_order);
        rows.push(Order {
            order_id: row[order_idx].to_string(),
            customer_id: normalize_key(&row[customer_idx]),
            amount,
            amount_valid: amount.is_some(),
            order_date,
            order_date_valid: order_date.is_some(),
            extra: extra_idx.iter().map(|&i| row[i].clone()).collect(),
        });
    }

    check_unique_order_ids(&rows)?;

    let mut invalid = BTreeMap::new();
    invalid.insert(AMOUNT.to_string(), rows.iter().filter(|o| !o.amount_valid).count());
    invalid.insert(
        ORDER_DATE.to_string(),
        rows.iter().filter(|o| !o.order_date_valid).count(),
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
        "cleaned orders"
    );

    Ok(Cleaned {
        data: Orders {
            columns: output_columns(&raw.columns, &[AMOUNT_VALID, ORDER_DATE_VALID]),
            rows,
        },
        report,
    })
}

/// Gate a cleaned row-set: non-empty, no repeated order id.
pub fn validate_orders(orders: &Orders) -> Result<(), ReconError> {
    if orders.is_empty() {
        return Err(ReconError::EmptyDataset { dataset: Dataset::Orders });
    }
    check_unique_order_ids(&orders.rows)
}

fn check_unique_order_ids(rows: &[Order]) -> Result<(), ReconError> {
    let duplicates = find_duplicates(rows.iter().map(|o| o.order_id.as_str()));
    if duplicates.is_empty() {
        return Ok(());
    }
    tracing::warn!(duplicate_keys = duplicates.len(), "duplicate order ids");
    Err(ReconError::DuplicateKey {
        dataset: Dataset::Orders,
        column: ORDER_ID.into(),
        duplicates,
    })
}
