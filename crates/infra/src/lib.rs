//! # KSeF Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - SQLite repositories with optional SQLCipher encryption
//! - The blocking KSeF HTTP adapter and the connection diagnostic
//! - RSA-OAEP token encryption
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `ksef-core`
//! - Contains all "impure" code (database, network, filesystem)

pub mod config;
pub mod crypto;
pub mod database;
pub mod errors;
pub mod http;
pub mod ksef;

// Re-export commonly used items
pub use crypto::{PemFileTokenEncryptor, RsaTokenEncryptor};
pub use database::{
    DbManager, SqliteCounterpartyRepository, SqliteCredentialRepository, SqliteInvoiceRepository,
};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use ksef::{diagnose_connection, ConnectionReport, KsefHttpClient, KsefHttpConnector};
