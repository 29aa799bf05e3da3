use std::collections::HashSet;

use crate::model::{Customers, Orders, ReconReport, ReconSummary};
use crate::normalize::normalize_str;

/// Partition both sides by key membership.
///
/// Keys are re-normalized on the way in (a no-op for cleaned input). Each orphan
/// subset keeps the row order of its input. Empty inputs are fine; rejecting
/// them is the validators' job.
pub fn reconcile(customers: &Customers, orders: &Orders) -> ReconReport {
    let customer_keys: Vec<String> = customers.rows.iter().map(|c| normalize_str(&c.customer_id)).collect();
    let order_keys: Vec<String> = orders.rows.iter().map(|o| normalize_str(&o.customer_id)).collect();

    let known_customers: HashSet<&str> = customer_keys.iter().map(String::as_str).collect();
    let ordering_customers: HashSet<&str> = order_keys.iter().map(String::as_str).collect();

    let orders_without_customers = orders.with_rows(
        orders
            .rows
            .iter()
            .zip(&order_keys)
            .filter(|(_, key)| !known_customers.contains(key.as_str()))
            .map(|(order, _)| order.clone())
            .collect(),
    );

    let customers_without_orders = customers.with_rows(
        customers
            .rows
            .iter()
            .zip(&customer_keys)
            .filter(|(_, key)| !ordering_customers.contains(key.as_str()))
            .map(|(customer, _)| customer.clone())
            .collect(),
    );

    let summary = ReconSummary {
        total_customers: customers.len(),
        total_orders: orders.len(),
        orders_without_customers_count: orders_without_customers.len(),
        customers_without_orders_count: customers_without_orders.len(),
    };

    tracing::debug!(
        total_customers = summary.total_customers,
        total_orders = summary.total_orders,
        orphan_orders = summary.orders_without_customers_count,
        orphan_customers = summary.customers_without_orders_count,
        "reconciled"
    );

    ReconReport {
        orders_without_customers,
        customers_without_orders,
        summary,
    }
}
