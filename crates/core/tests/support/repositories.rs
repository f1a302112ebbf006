//! In-memory implementations of the persistence ports
//!
//! Each mock keeps its rows behind a `parking_lot::Mutex` so tests can share
//! one instance between the service under test and their assertions.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use ksef_core::{CounterpartyStore, CredentialStore, InvoiceRepository, InvoiceStateStore};
use ksef_domain::{
    CompanyCredential, Counterparty, Invoice, KsefError, KsefStatus, NewCounterparty, NewInvoice,
    Result as DomainResult, SubmissionState,
};
use parking_lot::Mutex;

#[derive(Default)]
struct InvoiceTable {
    next_id: i64,
    rows: BTreeMap<i64, Invoice>,
}

/// In-memory mock for `InvoiceRepository` and `InvoiceStateStore`.
///
/// Transitions follow the same compare-and-swap rule as the SQLite store:
/// the row must still carry the expected status, and an existing reference
/// number is never replaced.
#[derive(Default)]
pub struct MockInvoiceRepository {
    table: Mutex<InvoiceTable>,
    fail_transitions: AtomicBool,
    transitions: Mutex<Vec<(i64, KsefStatus)>>,
}

impl MockInvoiceRepository {
    /// Insert an invoice directly, bypassing the port.
    pub fn seed(&self, invoice: &NewInvoice) -> Invoice {
        self.create_invoice(invoice).unwrap()
    }

    /// Overwrite the submission state of a seeded invoice.
    pub fn set_submission(&self, id: i64, state: SubmissionState) {
        self.table.lock().rows.get_mut(&id).unwrap().submission = state;
    }

    pub fn invoice(&self, id: i64) -> Invoice {
        self.table.lock().rows.get(&id).cloned().unwrap()
    }

    pub fn all(&self) -> Vec<Invoice> {
        self.table.lock().rows.values().cloned().collect()
    }

    /// Make every following `transition` call fail with a database error.
    pub fn fail_transitions(&self) {
        self.fail_transitions.store(true, Ordering::SeqCst);
    }

    /// `(invoice_id, new_status)` of every applied transition.
    pub fn applied_transitions(&self) -> Vec<(i64, KsefStatus)> {
        self.transitions.lock().clone()
    }
}

impl InvoiceRepository for MockInvoiceRepository {
    fn get_invoice(&self, id: i64) -> DomainResult<Option<Invoice>> {
        Ok(self.table.lock().rows.get(&id).cloned())
    }

    fn invoice_number_exists(&self, tenant_id: &str, invoice_number: &str) -> DomainResult<bool> {
        Ok(self
            .table
            .lock()
            .rows
            .values()
            .any(|row| row.tenant_id == tenant_id && row.invoice_number == invoice_number))
    }

    fn create_invoice(&self, invoice: &NewInvoice) -> DomainResult<Invoice> {
        if self.invoice_number_exists(&invoice.tenant_id, &invoice.invoice_number)? {
            return Err(KsefError::Database(format!(
                "UNIQUE constraint failed: invoices.invoice_number ({})",
                invoice.invoice_number
            )));
        }

        let mut table = self.table.lock();
        table.next_id += 1;
        let created = Invoice {
            id: table.next_id,
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
        };
        table.rows.insert(created.id, created.clone());
        Ok(created)
    }

    fn invoices_by_ids(&self, tenant_id: &str, ids: &[i64]) -> DomainResult<Vec<Invoice>> {
        let table = self.table.lock();
        Ok(ids
            .iter()
            .filter_map(|id| table.rows.get(id))
            .filter(|row| row.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    fn list_invoices(&self, tenant_id: &str) -> DomainResult<Vec<Invoice>> {
        let mut rows: Vec<Invoice> = self
            .table
            .lock()
            .rows
            .values()
            .filter(|row| row.tenant_id == tenant_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.issue_date.cmp(&a.issue_date));
        Ok(rows)
    }
}

impl InvoiceStateStore for MockInvoiceRepository {
    fn transition(
        &self,
        invoice_id: i64,
        expected: KsefStatus,
        state: &SubmissionState,
    ) -> DomainResult<bool> {
        if self.fail_transitions.load(Ordering::SeqCst) {
            return Err(KsefError::Database("disk I/O error".into()));
        }

        let mut table = self.table.lock();
        let Some(row) = table.rows.get_mut(&invoice_id) else {
            return Ok(false);
        };
        if row.submission.status != expected {
            return Ok(false);
        }

        let reference = row.submission.reference_number.clone().or(state.reference_number.clone());
        row.submission = SubmissionState { reference_number: reference, ..state.clone() };
        self.transitions.lock().push((invoice_id, state.status));
        Ok(true)
    }
}

/// In-memory mock for `CounterpartyStore`.
#[derive(Default)]
pub struct MockCounterpartyStore {
    rows: Mutex<Vec<Counterparty>>,
}

impl MockCounterpartyStore {
    pub fn seed(&self, counterparty: NewCounterparty) -> Counterparty {
        self.create_counterparty(&counterparty).unwrap()
    }

    pub fn all(&self) -> Vec<Counterparty> {
        self.rows.lock().clone()
    }
}

impl CounterpartyStore for MockCounterpartyStore {
    fn get_counterparty(&self, id: i64) -> DomainResult<Option<Counterparty>> {
        Ok(self.rows.lock().iter().find(|row| row.id == id).cloned())
    }

    fn find_by_tax_id(&self, tenant_id: &str, tax_id: &str) -> DomainResult<Option<Counterparty>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|row| row.tenant_id == tenant_id && row.tax_id.as_deref() == Some(tax_id))
            .cloned())
    }

    fn find_by_name_without_tax_id(
        &self,
        tenant_id: &str,
        name: &str,
    ) -> DomainResult<Option<Counterparty>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|row| row.tenant_id == tenant_id && row.tax_id.is_none() && row.name == name)
            .cloned())
    }

    fn create_counterparty(&self, counterparty: &NewCounterparty) -> DomainResult<Counterparty> {
        let mut rows = self.rows.lock();
        let created = Counterparty {
            id: rows.len() as i64 + 1,
            tenant_id: counterparty.tenant_id.clone(),
            name: counterparty.name.clone(),
            tax_id: counterparty.tax_id.clone(),
            street: counterparty.street.clone(),
            zip_code: counterparty.zip_code.clone(),
            city: counterparty.city.clone(),
        };
        rows.push(created.clone());
        Ok(created)
    }
}

/// In-memory mock for `CredentialStore`.
#[derive(Default)]
pub struct MockCredentialStore {
    rows: Mutex<HashMap<String, CompanyCredential>>,
}

impl MockCredentialStore {
    pub fn with(credential: CompanyCredential) -> Self {
        let store = Self::default();
        store.save(&credential).unwrap();
        store
    }

    pub fn get(&self, tenant_id: &str) -> Option<CompanyCredential> {
        self.rows.lock().get(tenant_id).cloned()
    }
}

impl CredentialStore for MockCredentialStore {
    fn load(&self, tenant_id: &str) -> DomainResult<Option<CompanyCredential>> {
        Ok(self.rows.lock().get(tenant_id).cloned())
    }

    fn save(&self, credential: &CompanyCredential) -> DomainResult<()> {
        self.rows.lock().insert(credential.tenant_id.clone(), credential.clone());
        Ok(())
    }
}
