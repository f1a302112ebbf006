//! Port interfaces for invoice and counterparty persistence
//!
//! Submission state is written through [`InvoiceStateStore`] only, so the
//! orchestrator and the poller never rewrite invoice content.

use ksef_domain::{
    Counterparty, Invoice, KsefStatus, NewCounterparty, NewInvoice, Result, SubmissionState,
};

/// Invoice reads and creation.
pub trait InvoiceRepository: Send + Sync {
    /// Fetch an invoice with its items.
    fn get_invoice(&self, id: i64) -> Result<Option<Invoice>>;

    /// Whether the tenant already has an invoice with this number.
    fn invoice_number_exists(&self, tenant_id: &str, invoice_number: &str) -> Result<bool>;

    /// Insert an invoice and its items in one transaction.
    fn create_invoice(&self, invoice: &NewInvoice) -> Result<Invoice>;

    /// Invoices owned by `tenant_id` among `ids`; foreign or unknown ids are
    /// silently skipped.
    fn invoices_by_ids(&self, tenant_id: &str, ids: &[i64]) -> Result<Vec<Invoice>>;

    /// All invoices of a tenant, newest issue date first.
    fn list_invoices(&self, tenant_id: &str) -> Result<Vec<Invoice>>;
}

/// Atomic submission-state transitions.
pub trait InvoiceStateStore: Send + Sync {
    /// Replace the submission state of `invoice_id` if its current status is
    /// still `expected`.
    ///
    /// The reference number is only written when none is stored yet.
    ///
    /// # Returns
    /// `false` when the status changed underneath the caller.
    fn transition(
        &self,
        invoice_id: i64,
        expected: KsefStatus,
        state: &SubmissionState,
    ) -> Result<bool>;
}

/// Counterparty lookups used by invoice import and XML generation.
pub trait CounterpartyStore: Send + Sync {
    fn get_counterparty(&self, id: i64) -> Result<Option<Counterparty>>;

    fn find_by_tax_id(&self, tenant_id: &str, tax_id: &str) -> Result<Option<Counterparty>>;

    /// Counterparty registered by name only (no tax id).
    fn find_by_name_without_tax_id(
        &self,
        tenant_id: &str,
        name: &str,
    ) -> Result<Option<Counterparty>>;

    fn create_counterparty(&self, counterparty: &NewCounterparty) -> Result<Counterparty>;
}
