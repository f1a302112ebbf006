//! Invoice and counterparty persistence ports

pub mod ports;

pub use ports::{CounterpartyStore, InvoiceRepository, InvoiceStateStore};
