use serde::Serialize;

use crate::config::ReconConfig;
use crate::customers::clean_and_validate_customers_with;
use crate::error::ReconError;
use crate::join::build_combined;
use crate::model::{Cleaned, Combined, Customers, Orders, ReconReport};
use crate::orders::clean_and_validate_orders_with;
use crate::reconcile::reconcile;
use crate::table::Table;

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

/// Everything one job produces.
#[derive(Debug, Clone)]
pub struct ReconRun {
    pub meta: RunMeta,
    pub customers: Cleaned<Customers>,
    pub orders: Cleaned<Orders>,
    pub report: ReconReport,
    /// Present when `[output] combined` is on.
    pub combined: Option<Combined>,
}

/// Clean and validate both tables, reconcile them, and build the combined
/// dataset if the config asks for it. Fails on the first invalid dataset,
/// customers first.
pub fn run(config: &ReconConfig, customers: &Table, orders: &Table) -> Result<ReconRun, ReconError> {
    let options = config.clean_options();
    let customers = clean_and_validate_customers_with(customers, &options)?;
    let orders = clean_and_validate_orders_with(orders, &options)?;

    let report = reconcile(&customers.data, &orders.data);
    let combined = config
        .output
        .combined
        .then(|| build_combined(&customers.data, &orders.data));

    tracing::info!(
        job = %config.name,
        orphan_orders = report.summary.orders_without_customers_count,
        orphan_customers = report.summary.customers_without_orders_count,
        "reconciliation finished"
    );

    Ok(ReconRun {
        meta: RunMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        customers,
        orders,
        report,
        combined,
    })
}
