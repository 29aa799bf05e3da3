//! `tally-recon`: customer/order cleaning, validation and reconciliation.
//!
//! Pure engine crate: receives pre-parsed tables, returns cleaned row-sets,
//! orphan reports and the combined dataset. No CLI or IO dependencies.

pub mod config;
pub mod customers;
pub mod dates;
pub mod engine;
pub mod error;
pub mod join;
pub mod model;
pub mod normalize;
pub mod orders;
pub mod reconcile;
pub mod table;

pub use config::ReconConfig;
pub use customers::{
    clean_and_validate_customers, clean_and_validate_customers_with, clean_customers,
    validate_customers,
};
pub use dates::DateOrder;
pub use engine::{run, ReconRun, RunMeta};
pub use error::ReconError;
pub use join::build_combined;
pub use model::{
    CleanOptions, CleanReport, Cleaned, Combined, CombinedRow, Customer, Customers, Dataset, Order,
    Orders, ReconReport, ReconSummary,
};
pub use normalize::normalize_key;
pub use orders::{
    clean_and_validate_orders, clean_and_validate_orders_with, clean_orders, validate_orders,
};
pub use reconcile::reconcile;
pub use table::{Cell, Table};
