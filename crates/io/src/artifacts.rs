//! Output directory layout for a finished run.

use std::path::{Path, PathBuf};

use tally_recon::ReconRun;

use crate::error::IoError;

pub const CLEAN_CUSTOMERS: &str = "clean_customers.csv";
pub const CLEAN_ORDERS: &str = "clean_orders.csv";
pub const ORDERS_WITHOUT_CUSTOMERS: &str = "orders_without_customers.csv";
pub const CUSTOMERS_WITHOUT_ORDERS: &str = "customers_without_orders.csv";
pub const COMBINED: &str = "combined.csv";
pub const SUMMARY: &str = "summary.json";

/// Write every artifact of `run` into `dir`, creating it if needed. Existing
/// files are overwritten. Returns the written paths in write order.
pub fn write_run(run: &ReconRun, dir: &Path) -> Result<Vec<PathBuf>, IoError> {
    std::fs::create_dir_all(dir).map_err(|source| IoError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut tables = vec![
        (CLEAN_CUSTOMERS, run.customers.data.to_table()),
        (CLEAN_ORDERS, run.orders.data.to_table()),
        (ORDERS_WITHOUT_CUSTOMERS, run.report.orders_without_customers.to_table()),
        (CUSTOMERS_WITHOUT_ORDERS, run.report.customers_without_orders.to_table()),
    ];
    if let Some(combined) = &run.combined {
        tables.push((COMBINED, combined.to_table()));
    }

    let mut written = Vec::with_capacity(tables.len() + 1);
    for (name, table) in &tables {
        let path = dir.join(name);
        crate::csv::export(table, &path)?;
        written.push(path);
    }

    let summary_path = dir.join(SUMMARY);
    let summary = serde_json::to_string_pretty(&run.report.summary)?;
    std::fs::write(&summary_path, summary + "\n").map_err(|source| IoError::Write {
        path: summary_path.clone(),
        source,
    })?;
    written.push(summary_path);

    tracing::info!(dir = %dir.display(), files = written.len(), "wrote run artifacts");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_recon::{run, ReconConfig, ReconSummary, Table};
    use tempfile::tempdir;

    fn sample_run(combined: bool) -> ReconRun {
        let config = ReconConfig::from_toml(&format!(
            "name = \"t\"\n[customers]\nfile = \"c.csv\"\n[orders]\nfile = \"o.csv\"\n[output]\ncombined = {combined}\n"
        ))
        .unwrap();
        let customers = Table::from_text_rows(
            &["customer_id", "email", "signup_date"],
            [["1", "a@x.com", "01/01/2023"], ["2", "b@x.com", "bad"]],
        );
        let orders = Table::from_text_rows(
            &["order_id", "customer_id", "amount", "order_date"],
            [["o1", "1", "5", "02/01/2023"], ["o2", "3", "", ""]],
        );
        run(&config, &customers, &orders).unwrap()
    }

    #[test]
    fn test_writes_full_layout() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("nested/output");
        let written = write_run(&sample_run(true), &out).unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                CLEAN_CUSTOMERS,
                CLEAN_ORDERS,
                ORDERS_WITHOUT_CUSTOMERS,
                CUSTOMERS_WITHOUT_ORDERS,
                COMBINED,
                SUMMARY
            ]
        );

        let customers = std::fs::read_to_string(out.join(CLEAN_CUSTOMERS)).unwrap();
        assert_eq!(
            customers,
            "customer_id,email,signup_date,email_valid,signup_date_valid\n\
             1,a@x.com,2023-01-01,true,true\n\
             2,b@x.com,,true,false\n"
        );

        let orphans = std::fs::read_to_string(out.join(ORDERS_WITHOUT_CUSTOMERS)).unwrap();
        assert_eq!(
            orphans,
            "order_id,customer_id,amount,order_date,amount_valid,order_date_valid\n\
             o2,3,,,false,false\n"
        );

        let summary: ReconSummary =
            serde_json::from_str(&std::fs::read_to_string(out.join(SUMMARY)).unwrap()).unwrap();
        assert_eq!(summary.orders_without_customers_count, 1);
        assert_eq!(summary.customers_without_orders_count, 1);
    }

    #[test]
    fn test_combined_skipped_when_disabled() {
        let dir = tempdir().unwrap();
        let written = write_run(&sample_run(false), dir.path()).unwrap();
        assert_eq!(written.len(), 5);
        assert!(!dir.path().join(COMBINED).exists());
    }
}
