//! # KSeF Domain
//!
//! Business domain types for the KSeF e-invoicing bridge.
//!
//! This crate contains:
//! - Credentials, counterparties, invoices and their submission state
//! - Records produced by the JPK_FA reader
//! - Domain error types and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other workspace crates
//! - No I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use utils::validation::{mask_token, normalize_nip, truncate_description, validate_api_token};
