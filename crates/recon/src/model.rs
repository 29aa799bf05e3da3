use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::DateOrder;
use crate::table::{Cell, Table};

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const CUSTOMER_ID: &str = "customer_id";
pub const EMAIL: &str = "email";
pub const EMAIL_VALID: &str = "email_valid";
pub const SIGNUP_DATE: &str = "signup_date";
pub const SIGNUP_DATE_VALID: &str = "signup_date_valid";

pub const ORDER_ID: &str = "order_id";
pub const AMOUNT: &str = "amount";
pub const AMOUNT_VALID: &str = "amount_valid";
pub const ORDER_DATE: &str = "order_date";
pub const ORDER_DATE_VALID: &str = "order_date_valid";

pub const CUSTOMER_EXISTS: &str = "customer_exists";

/// Columns a customers table must carry before cleaning.
pub const CUSTOMER_REQUIRED: [&str; 3] = [CUSTOMER_ID, EMAIL, SIGNUP_DATE];
/// Columns with a typed field on [`Customer`]; everything else is carried as extra.
pub const CUSTOMER_KNOWN: [&str; 5] = [CUSTOMER_ID, EMAIL, EMAIL_VALID, SIGNUP_DATE, SIGNUP_DATE_VALID];

/// Columns an orders table must carry before cleaning.
pub const ORDER_REQUIRED: [&str; 4] = [ORDER_ID, CUSTOMER_ID, AMOUNT, ORDER_DATE];
/// Columns with a typed field on [`Order`]; everything else is carried as extra.
pub const ORDER_KNOWN: [&str; 6] = [ORDER_ID, CUSTOMER_ID, AMOUNT, AMOUNT_VALID, ORDER_DATE, ORDER_DATE_VALID];

/// Which side of the reconciliation a table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Customers,
    Orders,
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customers => write!(f, "customers"),
            Self::Orders => write!(f, "orders"),
        }
    }
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanOptions {
    pub date_order: DateOrder,
}

/// Diagnostic counts produced by a cleaning pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub dataset: Dataset,
    pub input_rows: usize,
    /// Rows removed because a key column was null.
    pub dropped_missing_key: usize,
    pub output_rows: usize,
    /// Per flagged field, the number of rows whose flag is false.
    pub invalid: BTreeMap<String, usize>,
}

/// A cleaned row-set together with the report describing how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned<T> {
    pub data: T,
    pub report: CleanReport,
}

/// Output layout: input columns in order (minus stale flag columns), then flags.
pub(crate) fn output_columns(input: &[String], flags: &[&str]) -> Vec<String> {
    input
        .iter()
        .filter(|c| !flags.contains(&c.as_str()))
        .cloned()
        .chain(flags.iter().map(|f| f.to_string()))
        .collect()
}

fn date_cell(date: Option<NaiveDate>) -> Cell {
    date.map(|d| Cell::Text(d.format("%Y-%m-%d").to_string()))
        .unwrap_or(Cell::Null)
}

/// Lay out typed fields and extras in column order.
fn layout_cells(
    columns: &[String],
    extra: &[Cell],
    typed: impl Fn(&str) -> Option<Cell>,
) -> Vec<Cell> {
    let mut extra = extra.iter();
    columns
        .iter()
        .map(|c| typed(c).unwrap_or_else(|| extra.next().cloned().unwrap_or(Cell::Null)))
        .collect()
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    /// Normalized key.
    pub customer_id: String,
    pub email: Option<String>,
    pub email_valid: bool,
    pub signup_date: Option<NaiveDate>,
    pub signup_date_valid: bool,
    /// Cells of the non-typed columns, in column order.
    pub extra: Vec<Cell>,
}

impl Customer {
    pub(crate) fn typed_cell(&self, column: &str) -> Option<Cell> {
        match column {
            CUSTOMER_ID => Some(Cell::Text(self.customer_id.clone())),
            EMAIL => Some(self.email.clone().into()),
            EMAIL_VALID => Some(self.email_valid.into()),
            SIGNUP_DATE => Some(date_cell(self.signup_date)),
            SIGNUP_DATE_VALID => Some(self.signup_date_valid.into()),
            _ => None,
        }
    }

    pub fn to_cells(&self, columns: &[String]) -> Vec<Cell> {
        layout_cells(columns, &self.extra, |c| self.typed_cell(c))
    }
}

/// Cleaned customers row-set.
#[derive(Debug, Clone, PartialEq)]
pub struct Customers {
    /// Output column order; includes every typed column plus the extras.
    pub columns: Vec<String>,
    pub rows: Vec<Customer>,
}

impl Default for Customers {
    fn default() -> Self {
        Self {
            columns: output_columns(
                &[CUSTOMER_ID.to_string(), EMAIL.to_string(), SIGNUP_DATE.to_string()],
                &[EMAIL_VALID, SIGNUP_DATE_VALID],
            ),
            rows: Vec::new(),
        }
    }
}

impl Customers {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Same layout, subset of rows.
    pub(crate) fn with_rows(&self, rows: Vec<Customer>) -> Self {
        Self { columns: self.columns.clone(), rows }
    }

    pub fn to_table(&self) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().map(|r| r.to_cells(&self.columns)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Identity as received (not normalized).
    pub order_id: String,
    /// Normalized foreign key.
    pub customer_id: String,
    pub amount: Option<f64>,
    pub amount_valid: bool,
    pub order_date: Option<NaiveDate>,
    pub order_date_valid: bool,
    pub extra: Vec<Cell>,
}

impl Order {
    pub(crate) fn typed_cell(&self, column: &str) -> Option<Cell> {
        match column {
            ORDER_ID => Some(Cell::Text(self.order_id.clone())),
            CUSTOMER_ID => Some(Cell::Text(self.customer_id.clone())),
            AMOUNT => Some(self.amount.into()),
            AMOUNT_VALID => Some(self.amount_valid.into()),
            ORDER_DATE => Some(date_cell(self.order_date)),
            ORDER_DATE_VALID => Some(self.order_date_valid.into()),
            _ => None,
        }
    }

    pub fn to_cells(&self, columns: &[String]) -> Vec<Cell> {
        layout_cells(columns, &self.extra, |c| self.typed_cell(c))
    }
}

/// Cleaned orders row-set.
#[derive(Debug, Clone, PartialEq)]
pub struct Orders {
    pub columns: Vec<String>,
    pub rows: Vec<Order>,
}

impl Default for Orders {
    fn default() -> Self {
        Self {
            columns: output_columns(
                &ORDER_REQUIRED.map(String::from),
                &[AMOUNT_VALID, ORDER_DATE_VALID],
            ),
            rows: Vec::new(),
        }
    }
}

impl Orders {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn with_rows(&self, rows: Vec<Order>) -> Self {
        Self { columns: self.columns.clone(), rows }
    }

    pub fn to_table(&self) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().map(|r| r.to_cells(&self.columns)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconSummary {
    pub total_customers: usize,
    pub total_orders: usize,
    pub orders_without_customers_count: usize,
    pub customers_without_orders_count: usize,
}

impl ReconSummary {
    pub fn has_orphans(&self) -> bool {
        self.orders_without_customers_count > 0 || self.customers_without_orders_count > 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconReport {
    pub orders_without_customers: Orders,
    pub customers_without_orders: Customers,
    pub summary: ReconSummary,
}

// ---------------------------------------------------------------------------
// Combined dataset
// ---------------------------------------------------------------------------

/// One order with its matching customer, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRow {
    pub order: Order,
    pub customer: Option<Customer>,
}

impl CombinedRow {
    pub fn customer_exists(&self) -> bool {
        self.customer.is_some()
    }

    /// False when the customer is absent.
    pub fn email_valid(&self) -> bool {
        self.customer.as_ref().is_some_and(|c| c.email_valid)
    }

    /// False when the customer is absent.
    pub fn signup_date_valid(&self) -> bool {
        self.customer.as_ref().is_some_and(|c| c.signup_date_valid)
    }
}

/// Left join of orders onto customers.
#[derive(Debug, Clone, PartialEq)]
pub struct Combined {
    pub order_columns: Vec<String>,
    pub customer_columns: Vec<String>,
    pub rows: Vec<CombinedRow>,
}
