//! SQLite implementation of invoice persistence and submission-state updates.
//!
//! Amounts are stored as decimal text and dates as ISO-8601 text, so values
//! round-trip without floating point.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use ksef_core::{InvoiceRepository, InvoiceStateStore};
use ksef_domain::{Invoice, InvoiceItem, KsefStatus, NewInvoice, Result, SubmissionState};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::manager::{map_sql_error, DbManager};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteInvoiceRepository {
    db: Arc<DbManager>,
}

impl SqliteInvoiceRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn load_items(conn: &Connection, invoice_id: i64) -> Result<Vec<InvoiceItem>> {
        let mut stmt = conn.prepare(ITEM_SELECT_SQL).map_err(map_sql_error)?;
        let rows = stmt.query_map(params![invoice_id], map_item_row).map_err(map_sql_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
    }

    fn with_items(conn: &Connection, mut invoice: Invoice) -> Result<Invoice> {
        invoice.items = Self::load_items(conn, invoice.id)?;
        Ok(invoice)
    }
}

impl InvoiceRepository for SqliteInvoiceRepository {
    fn get_invoice(&self, id: i64) -> Result<Option<Invoice>> {
        let conn = self.db.get_connection()?;
        let invoice = conn
            .query_row(&format!("{INVOICE_SELECT_SQL} WHERE id = ?1"), [id], map_invoice_row)
            .optional()
            .map_err(map_sql_error)?;

        invoice.map(|invoice| Self::with_items(&conn, invoice)).transpose()
    }

    fn invoice_number_exists(&self, tenant_id: &str, invoice_number: &str) -> Result<bool> {
        let conn = self.db.get_connection()?;
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM invoices WHERE tenant_id = ?1 AND invoice_number = ?2)",
            params![tenant_id, invoice_number],
            |row| row.get::<_, bool>(0),
        )
        .map_err(map_sql_error)
    }

    fn create_invoice(&self, invoice: &NewInvoice) -> Result<Invoice> {
        let mut conn = self.db.get_connection()?;
        let tx = conn.transaction().map_err(map_sql_error)?;

        tx.execute(
            INVOICE_INSERT_SQL,
            params![
                invoice.tenant_id,
                invoice.invoice_number,
                invoice.issue_date.format(DATE_FORMAT).to_string(),
                invoice.sale_date.format(DATE_FORMAT).to_string(),
                invoice.payment_date.format(DATE_FORMAT).to_string(),
                invoice.payment_method,
                invoice.counterparty_id,
                invoice.total_amount.to_string(),
                invoice.notes,
                invoice.is_correction,
                invoice.correction_reason,
                invoice.corrected_invoice_number,
                KsefStatus::Unsent.as_str(),
            ],
        )
        .map_err(map_sql_error)?;
        let id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(ITEM_INSERT_SQL).map_err(map_sql_error)?;
            for (position, item) in invoice.items.iter().enumerate() {
                stmt.execute(params![
                    id,
                    position as i64,
                    item.name,
                    item.quantity.to_string(),
                    item.unit,
                    item.unit_price.to_string(),
                    item.total_price.to_string(),
                ])
                .map_err(map_sql_error)?;
            }
        }

        tx.commit().map_err(map_sql_error)?;
        debug!(invoice_id = id, items = invoice.items.len(), "invoice stored");

        Ok(Invoice {
            id,
            tenant_id: invoice.tenant_id.clone(),
            invoice_number: invoice.invoice_number.clone(),
            issue_date: invoice.issue_date,
            sale_date: invoice.sale_date,
            payment_date: invoice.payment_date,
            payment_method: invoice.payment_method.clone(),
            counterparty_id: invoice.counterparty_id,
            total_amount: invoice.total_amount,
            notes: invoice.notes.clone(),
            is_correction: invoice.is_correction,
            correction_reason: invoice.correction_reason.clone(),
            corrected_invoice_number: invoice.corrected_invoice_number.clone(),
            items: invoice.items.clone(),
            submission: SubmissionState::default(),
        })
    }

    fn invoices_by_ids(&self, tenant_id: &str, ids: &[i64]) -> Result<Vec<Invoice>> {
        let conn = self.db.get_connection()?;
        let sql = format!("{INVOICE_SELECT_SQL} WHERE id = ?1 AND tenant_id = ?2");
        let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;

        let mut invoices = Vec::with_capacity(ids.len());
        for id in ids {
            let found = stmt
                .query_row(params![id, tenant_id], map_invoice_row)
                .optional()
                .map_err(map_sql_error)?;
            if let Some(invoice) = found {
                invoices.push(Self::with_items(&conn, invoice)?);
            }
        }
        Ok(invoices)
    }

    fn list_invoices(&self, tenant_id: &str) -> Result<Vec<Invoice>> {
        let conn = self.db.get_connection()?;
        let sql =
            format!("{INVOICE_SELECT_SQL} WHERE tenant_id = ?1 ORDER BY issue_date DESC, id DESC");
        let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
        let headers = stmt
            .query_map(params![tenant_id], map_invoice_row)
            .map_err(map_sql_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sql_error)?;

        headers.into_iter().map(|invoice| Self::with_items(&conn, invoice)).collect()
    }
}

impl InvoiceStateStore for SqliteInvoiceRepository {
    fn transition(
        &self,
        invoice_id: i64,
        expected: KsefStatus,
        state: &SubmissionState,
    ) -> Result<bool> {
        let conn = self.db.get_connection()?;
        let changed = conn
            .execute(
                TRANSITION_SQL,
                params![
                    state.status.as_str(),
                    state.reference_number,
                    state.session_id,
                    state.sent_at.map(|sent_at| sent_at.to_rfc3339()),
                    state.processing_description,
                    invoice_id,
                    expected.as_str(),
                ],
            )
            .map_err(map_sql_error)?;

        debug!(
            invoice_id,
            from = %expected,
            to = %state.status,
            applied = changed == 1,
            "submission state transition"
        );
        Ok(changed == 1)
    }
}

fn text_column<T, E>(
    row: &Row<'_>,
    idx: usize,
    parse: impl FnOnce(&str) -> std::result::Result<T, E>,
) -> rusqlite::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    parse(&raw).map_err(|err| conversion_error(idx, err))
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    text_column(row, idx, Decimal::from_str)
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    text_column(row, idx, |raw| NaiveDate::parse_from_str(raw, DATE_FORMAT))
}

fn parse_status(raw: &str) -> KsefStatus {
    raw.parse::<KsefStatus>().unwrap_or_else(|_| {
        warn!(status = %raw, "unknown stored KSeF status, treating as error");
        KsefStatus::Error
    })
}

fn map_invoice_row(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    let status: String = row.get(13)?;
    let sent_at = row
        .get::<_, Option<String>>(15)?
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|parsed| parsed.with_timezone(&Utc))
                .map_err(|err| conversion_error(15, err))
        })
        .transpose()?;

    Ok(Invoice {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        invoice_number: row.get(2)?,
        issue_date: date_column(row, 3)?,
        sale_date: date_column(row, 4)?,
        payment_date: date_column(row, 5)?,
        payment_method: row.get(6)?,
        counterparty_id: row.get(7)?,
        total_amount: decimal_column(row, 8)?,
        notes: row.get(9)?,
        is_correction: row.get(10)?,
        correction_reason: row.get(11)?,
        corrected_invoice_number: row.get(12)?,
        items: Vec::new(),
        submission: SubmissionState {
            status: parse_status(&status),
            reference_number: row.get(14)?,
            sent_at,
            session_id: row.get(16)?,
            processing_description: row.get(17)?,
        },
    })
}

fn map_item_row(row: &Row<'_>) -> rusqlite::Result<InvoiceItem> {
    Ok(InvoiceItem {
        name: row.get(0)?,
        quantity: decimal_column(row, 1)?,
        unit: row.get(2)?,
        unit_price: decimal_column(row, 3)?,
        total_price: decimal_column(row, 4)?,
    })
}

const INVOICE_SELECT_SQL: &str = "SELECT
        id, tenant_id, invoice_number, issue_date, sale_date, payment_date, payment_method,
        counterparty_id, total_amount, notes, is_correction, correction_reason,
        corrected_invoice_number, ksef_status, ksef_reference_number, ksef_sent_at,
        ksef_session_id, ksef_processing_description
    FROM invoices";

const INVOICE_INSERT_SQL: &str = "INSERT INTO invoices (
        tenant_id, invoice_number, issue_date, sale_date, payment_date, payment_method,
        counterparty_id, total_amount, notes, is_correction, correction_reason,
        corrected_invoice_number, ksef_status, created_at
    ) VALUES (
        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
        CAST(strftime('%s','now') AS INTEGER)
    )";

const ITEM_SELECT_SQL: &str = "SELECT name, quantity, unit, unit_price, total_price
    FROM invoice_items
    WHERE invoice_id = ?1
    ORDER BY position";

const ITEM_INSERT_SQL: &str = "INSERT INTO invoice_items (
        invoice_id, position, name, quantity, unit, unit_price, total_price
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

/// Compare-and-swap on the current status. The reference number is only
/// written while the column is still null.
const TRANSITION_SQL: &str = "UPDATE invoices SET
        ksef_status = ?1,
        ksef_reference_number = COALESCE(ksef_reference_number, ?2),
        ksef_session_id = ?3,
        ksef_sent_at = ?4,
        ksef_processing_description = ?5
    WHERE id = ?6 AND ksef_status = ?7";
