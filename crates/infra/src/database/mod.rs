//! Database implementations

pub mod counterparty_repository;
pub mod credential_repository;
pub mod invoice_repository;
pub mod manager;
pub mod pool;

pub use counterparty_repository::*;
pub use credential_repository::*;
pub use invoice_repository::*;
pub use manager::*;
pub use pool::{DbConnection, SqlitePool};
