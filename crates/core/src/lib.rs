//! # KSeF Core
//!
//! Business logic of the KSeF bridge - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for persistence, the KSeF API and token
//!   encryption
//! - Session negotiation, invoice submission and status polling
//! - FA(3) document generation and JPK_FA import/export
//!
//! ## Architecture Principles
//! - Only depends on `ksef-domain`
//! - No database, HTTP or filesystem code
//! - All external dependencies via traits

pub mod credentials;
pub mod document;
pub mod invoices;
pub mod jpk;
pub mod ksef;

pub use credentials::{CompanyDetails, CredentialService, CredentialStore, TokenReport};
pub use document::InvoiceXmlBuilder;
pub use invoices::{CounterpartyStore, InvoiceRepository, InvoiceStateStore};
pub use jpk::{ImportReport, ImportedInvoice, JpkExporter, JpkImporter};
pub use ksef::ports::{
    AuthChallenge, ContextIdentifier, KsefApi, KsefApiFactory, PublicKeyCertificate,
    SendInvoiceResponse, SessionStatus, TokenAuthRequest, TokenEncryptor,
};
pub use ksef::{
    OutcomeLevel, SessionNegotiator, StatusCheckOutcome, StatusPoller, SubmissionOrchestrator,
    SubmissionOutcome,
};
