//! Left join of orders onto customers.

use std::collections::HashMap;

use crate::model::{
    Combined, CombinedRow, Customer, Customers, Orders, CUSTOMER_EXISTS, CUSTOMER_ID, EMAIL_VALID,
    SIGNUP_DATE_VALID,
};
use crate::normalize::normalize_str;
use crate::table::{Cell, Table};

/// Suffix for customer-side columns whose name is already taken by an order column.
pub const CUSTOMER_SUFFIX: &str = "_customer";

/// Attach each order's customer, if any. Every order appears exactly once, in
/// input order. Neither input is modified.
pub fn build_combined(customers: &Customers, orders: &Orders) -> Combined {
    let by_key: HashMap<String, &Customer> = customers
        .rows
        .iter()
        .map(|c| (normalize_str(&c.customer_id), c))
        .collect();

    let rows: Vec<CombinedRow> = orders
        .rows
        .iter()
        .map(|order| CombinedRow {
            order: order.clone(),
            customer: by_key.get(&normalize_str(&order.customer_id)).map(|c| (*c).clone()),
        })
        .collect();

    let matched = rows.iter().filter(|r| r.customer_exists()).count();
    tracing::debug!(rows = rows.len(), matched, "built combined dataset");

    Combined {
        order_columns: orders.columns.clone(),
        customer_columns: customers.columns.clone(),
        rows,
    }
}

impl Combined {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Customer columns carried into the join, without the join key.
    fn attached_customer_columns(&self) -> impl Iterator<Item = &String> {
        self.customer_columns.iter().filter(|c| c.as_str() != CUSTOMER_ID)
    }

    /// Header of the tabular form: order columns, customer columns (renamed on
    /// collision), then `customer_exists`.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = self.order_columns.clone();
        for name in self.attached_customer_columns() {
            if self.order_columns.contains(name) || name == CUSTOMER_EXISTS {
                columns.push(format!("{name}{CUSTOMER_SUFFIX}"));
            } else {
                columns.push(name.clone());
            }
        }
        columns.push(CUSTOMER_EXISTS.to_string());
        columns
    }

    pub fn to_table(&self) -> Table {
        let customer_columns: Vec<String> = self.attached_customer_columns().cloned().collect();
        let mut table = Table::new(self.columns());
        for row in &self.rows {
            let mut cells = row.order.to_cells(&self.order_columns);
            match &row.customer {
                Some(customer) => cells.extend(customer.to_cells(&customer_columns)),
                None => cells.extend(customer_columns.iter().map(|name| absent_customer_cell(name))),
            }
            cells.push(row.customer_exists().into());
            table.push_row(cells);
        }
        table
    }
}

/// Validity flags read false for a missing customer; everything else is null.
fn absent_customer_cell(column: &str) -> Cell {
    if column == EMAIL_VALID || column == SIGNUP_DATE_VALID {
        false.into()
    } else {
        Cell::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customers::clean_and_validate_customers;
    use crate::orders::clean_and_validate_orders;

    fn customers() -> Customers {
        let raw = Table::from_text_rows(
            &["customer_id", "email", "signup_date", "amount"],
            [
                ["1", "a@x.com", "01/01/2023", "vip"],
                ["2", "broken", "bad", "std"],
            ],
        );
        clean_and_validate_customers(&raw).unwrap().data
    }

    fn orders() -> Orders {
        let raw = Table::from_text_rows(
            &["order_id", "customer_id", "amount", "order_date"],
            [
                ["o1", "1", "10", "02/01/2023"],
                ["o2", "9", "20", "03/01/2023"],
                ["o3", "2.0", "30", "04/01/2023"],
            ],
        );
        clean_and_validate_orders(&raw).unwrap().data
    }

    #[test]
    fn one_row_per_order_in_order() {
        let combined = build_combined(&customers(), &orders());
        let ids: Vec<&str> = combined.rows.iter().map(|r| r.order.order_id.as_str()).collect();
        assert_eq!(ids, vec!["o1", "o2", "o3"]);
        let exists: Vec<bool> = combined.rows.iter().map(|r| r.customer_exists()).collect();
        assert_eq!(exists, vec![true, false, true]);
    }

    #[test]
    fn absent_customer_flags_default_false() {
        let combined = build_combined(&customers(), &orders());
        let orphan = &combined.rows[1];
        assert!(!orphan.email_valid());
        assert!(!orphan.signup_date_valid());
        assert!(combined.rows[0].email_valid());
        assert!(!combined.rows[2].email_valid());
    }

    #[test]
    fn tabular_form_renames_collisions() {
        let combined = build_combined(&customers(), &orders());
        assert_eq!(
            combined.columns(),
            vec![
                "order_id",
                "customer_id",
                "amount",
                "order_date",
                "amount_valid",
                "order_date_valid",
                "email",
                "signup_date",
                "amount_customer",
                "email_valid",
                "signup_date_valid",
                "customer_exists",
            ]
        );

        let table = combined.to_table();
        assert!(table.shape_error().is_none());
        let orphan = &table.rows[1];
        assert_eq!(orphan[6], Cell::Null);
        assert_eq!(orphan[8], Cell::Null);
        assert_eq!(orphan[9], Cell::text("false"));
        assert_eq!(orphan[11], Cell::text("false"));

        let matched = &table.rows[0];
        assert_eq!(matched[6], Cell::text("a@x.com"));
        assert_eq!(matched[7], Cell::text("2023-01-01"));
        assert_eq!(matched[8], Cell::text("vip"));
        assert_eq!(matched[11], Cell::text("true"));
    }

    #[test]
    fn inputs_are_untouched() {
        let (c, o) = (customers(), orders());
        let (c_before, o_before) = (c.clone(), o.clone());
        let _ = build_combined(&c, &o);
        assert_eq!(c, c_before);
        assert_eq!(o, o_before);
    }

    #[test]
    fn empty_orders_give_empty_join() {
        let combined = build_combined(&customers(), &Orders::default());
        assert!(combined.is_empty());
        assert_eq!(combined.to_table().columns.last().map(String::as_str), Some("customer_exists"));
    }
}
