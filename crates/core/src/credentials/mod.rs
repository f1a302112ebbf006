//! Per-tenant KSeF credentials and company profile

pub mod ports;
mod service;

pub use ports::CredentialStore;
pub use service::{CompanyDetails, CredentialService, TokenReport};
