//! Domain types and models

pub mod company;
pub mod import;
pub mod invoice;

pub use company::{CompanyCredential, Counterparty, KsefEnvironment, NewCounterparty};
pub use import::ImportedInvoiceRecord;
pub use invoice::{Invoice, InvoiceItem, KsefStatus, NewInvoice, SubmissionState};
