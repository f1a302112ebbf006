//! KSeF remote API adapter and connection diagnostic

mod client;
mod diagnostics;

pub use client::{KsefHttpClient, KsefHttpConnector};
pub use diagnostics::{
    diagnose_connection, CertificateSummary, ConnectionReport, LocalKeyStatus,
    SYMMETRIC_KEY_USAGE, TOKEN_ENCRYPTION_USAGE,
};
