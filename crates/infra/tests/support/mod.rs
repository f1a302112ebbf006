//! Shared fixtures for infra integration tests.

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use ksef_domain::{InvoiceItem, NewInvoice};
use ksef_infra::database::DbManager;
use rust_decimal::Decimal;
use tempfile::TempDir;

pub const TEST_DB_KEY: &str = "test_key_64_chars_long_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

/// Temporary migrated database; the directory lives as long as the value.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("ksef-test.db");

        let manager =
            DbManager::new(&db_path, 4, Some(TEST_DB_KEY)).expect("db manager should be created");
        manager.run_migrations().expect("schema migrations should apply");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    pub fn execute(&self, sql: &str) {
        let conn = self.manager.get_connection().expect("connection should be available");
        conn.execute_batch(sql).expect("SQL batch execution should succeed");
    }
}

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).expect("decimal literal")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Two-line invoice issued on `issue`.
pub fn new_invoice(tenant: &str, number: &str, issue: NaiveDate) -> NewInvoice {
    let mut invoice = NewInvoice::draft(tenant, number, issue, issue, Decimal::ZERO);
    invoice.attach_items(vec![
        InvoiceItem::priced("Consulting", dec("2"), "godz.", dec("150.00")),
        InvoiceItem::priced("Travel", dec("1.5"), "km", dec("0.8350")),
    ]);
    invoice
}
