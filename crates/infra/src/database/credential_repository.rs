//! SQLite implementation of the credential store.

use std::sync::Arc;

use ksef_core::CredentialStore;
use ksef_domain::{CompanyCredential, KsefEnvironment, Result};
use rusqlite::{params, OptionalExtension, Row};
use tracing::warn;

use super::manager::{map_sql_error, DbManager};

pub struct SqliteCredentialRepository {
    db: Arc<DbManager>,
}

impl SqliteCredentialRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

impl CredentialStore for SqliteCredentialRepository {
    fn load(&self, tenant_id: &str) -> Result<Option<CompanyCredential>> {
        let conn = self.db.get_connection()?;
        conn.query_row(CREDENTIAL_SELECT_SQL, params![tenant_id], map_credential_row)
            .optional()
            .map_err(map_sql_error)
    }

    fn save(&self, credential: &CompanyCredential) -> Result<()> {
        let conn = self.db.get_connection()?;
        conn.execute(
            CREDENTIAL_UPSERT_SQL,
            params![
                credential.tenant_id,
                credential.company_name,
                credential.tax_id,
                credential.street,
                credential.zip_code,
                credential.city,
                credential.ksef_token,
                credential.ksef_environment.as_str(),
            ],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }
}

fn map_credential_row(row: &Row<'_>) -> rusqlite::Result<CompanyCredential> {
    let environment: String = row.get(7)?;
    let ksef_environment = environment.parse::<KsefEnvironment>().unwrap_or_else(|_| {
        warn!(environment = %environment, "unknown stored KSeF environment, using test");
        KsefEnvironment::Test
    });

    Ok(CompanyCredential {
        tenant_id: row.get(0)?,
        company_name: row.get(1)?,
        tax_id: row.get(2)?,
        street: row.get(3)?,
        zip_code: row.get(4)?,
        city: row.get(5)?,
        ksef_token: row.get(6)?,
        ksef_environment,
    })
}

const CREDENTIAL_SELECT_SQL: &str = "SELECT
        tenant_id, company_name, tax_id, street, zip_code, city, ksef_token, ksef_environment
    FROM company_credentials
    WHERE tenant_id = ?1";

const CREDENTIAL_UPSERT_SQL: &str = "INSERT INTO company_credentials (
        tenant_id, company_name, tax_id, street, zip_code, city, ksef_token, ksef_environment,
        updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, CAST(strftime('%s','now') AS INTEGER))
    ON CONFLICT(tenant_id) DO UPDATE SET
        company_name = excluded.company_name,
        tax_id = excluded.tax_id,
        street = excluded.street,
        zip_code = excluded.zip_code,
        city = excluded.city,
        ksef_token = excluded.ksef_token,
        ksef_environment = excluded.ksef_environment,
        updated_at = excluded.updated_at";
