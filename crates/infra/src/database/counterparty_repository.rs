//! SQLite implementation of the counterparty store.

use std::sync::Arc;

use ksef_core::CounterpartyStore;
use ksef_domain::{Counterparty, NewCounterparty, Result};
use rusqlite::{params, OptionalExtension, Row};

use super::manager::{map_sql_error, DbManager};

pub struct SqliteCounterpartyRepository {
    db: Arc<DbManager>,
}

impl SqliteCounterpartyRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn query_one(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Option<Counterparty>> {
        let conn = self.db.get_connection()?;
        conn.query_row(sql, params, map_counterparty_row).optional().map_err(map_sql_error)
    }
}

impl CounterpartyStore for SqliteCounterpartyRepository {
    fn get_counterparty(&self, id: i64) -> Result<Option<Counterparty>> {
        self.query_one(&format!("{COUNTERPARTY_SELECT_SQL} WHERE id = ?1"), &[&id])
    }

    fn find_by_tax_id(&self, tenant_id: &str, tax_id: &str) -> Result<Option<Counterparty>> {
        self.query_one(
            &format!("{COUNTERPARTY_SELECT_SQL} WHERE tenant_id = ?1 AND tax_id = ?2"),
            &[&tenant_id, &tax_id],
        )
    }

    fn find_by_name_without_tax_id(
        &self,
        tenant_id: &str,
        name: &str,
    ) -> Result<Option<Counterparty>> {
        self.query_one(
            &format!(
                "{COUNTERPARTY_SELECT_SQL} WHERE tenant_id = ?1 AND name = ?2 AND tax_id IS NULL
                 ORDER BY id LIMIT 1"
            ),
            &[&tenant_id, &name],
        )
    }

    fn create_counterparty(&self, counterparty: &NewCounterparty) -> Result<Counterparty> {
        let conn = self.db.get_connection()?;
        conn.execute(
            "INSERT INTO counterparties (tenant_id, name, tax_id, street, zip_code, city)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                counterparty.tenant_id,
                counterparty.name,
                counterparty.tax_id,
                counterparty.street,
                counterparty.zip_code,
                counterparty.city,
            ],
        )
        .map_err(map_sql_error)?;

        Ok(Counterparty {
            id: conn.last_insert_rowid(),
            tenant_id: counterparty.tenant_id.clone(),
            name: counterparty.name.clone(),
            tax_id: counterparty.tax_id.clone(),
            street: counterparty.street.clone(),
            zip_code: counterparty.zip_code.clone(),
            city: counterparty.city.clone(),
        })
    }
}

fn map_counterparty_row(row: &Row<'_>) -> rusqlite::Result<Counterparty> {
    Ok(Counterparty {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        name: row.get(2)?,
        tax_id: row.get(3)?,
        street: row.get(4)?,
        zip_code: row.get(5)?,
        city: row.get(6)?,
    })
}

const COUNTERPARTY_SELECT_SQL: &str =
    "SELECT id, tenant_id, name, tax_id, street, zip_code, city FROM counterparties";
