//! Connection diagnostic
//!
//! Checks what an operator needs before the first submission: the remote
//! certificate list is reachable and carries the expected usages, and the
//! local public key file parses. Not used on the submission path.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::traits::PublicKeyParts;
use serde::Serialize;
use tracing::info;

use super::client::KsefHttpClient;
use crate::crypto::load_public_key;

pub const TOKEN_ENCRYPTION_USAGE: &str = "KsefTokenEncryption";
pub const SYMMETRIC_KEY_USAGE: &str = "SymmetricKeyEncryption";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateSummary {
    pub usages: Vec<String>,
    pub valid_from: Option<String>,
    pub valid_to: Option<String>,
    /// DER length, `None` when the certificate is not valid base64.
    pub der_length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LocalKeyStatus {
    Valid { bits: usize },
    Missing,
    Invalid { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionReport {
    pub base_url: String,
    pub certificates: Vec<CertificateSummary>,
    /// Set when the certificate list could not be fetched.
    pub remote_error: Option<String>,
    pub public_key_path: String,
    pub local_key: LocalKeyStatus,
}

impl ConnectionReport {
    pub fn has_usage(&self, usage: &str) -> bool {
        self.certificates.iter().any(|cert| cert.usages.iter().any(|u| u == usage))
    }

    /// Remote reachable, both usages published, local key usable.
    pub fn is_healthy(&self) -> bool {
        self.remote_error.is_none()
            && self.has_usage(TOKEN_ENCRYPTION_USAGE)
            && self.has_usage(SYMMETRIC_KEY_USAGE)
            && matches!(self.local_key, LocalKeyStatus::Valid { .. })
    }
}

/// Run the diagnostic. Remote failures are recorded in the report rather
/// than returned.
pub fn diagnose_connection(client: &KsefHttpClient, public_key_path: &Path) -> ConnectionReport {
    let (certificates, remote_error) = match client.public_key_certificates() {
        Ok(certificates) => (
            certificates
                .into_iter()
                .map(|cert| CertificateSummary {
                    der_length: STANDARD.decode(cert.certificate.trim()).ok().map(|der| der.len()),
                    usages: cert.usage,
                    valid_from: cert.valid_from,
                    valid_to: cert.valid_to,
                })
                .collect(),
            None,
        ),
        Err(err) => (Vec::new(), Some(err.to_string())),
    };

    let local_key = if public_key_path.exists() {
        match load_public_key(public_key_path) {
            Ok(key) => LocalKeyStatus::Valid { bits: key.size() * 8 },
            Err(err) => LocalKeyStatus::Invalid { reason: err.to_string() },
        }
    } else {
        LocalKeyStatus::Missing
    };

    let report = ConnectionReport {
        base_url: client.base_url().to_string(),
        certificates,
        remote_error,
        public_key_path: public_key_path.display().to_string(),
        local_key,
    };

    info!(
        base_url = %report.base_url,
        certificates = report.certificates.len(),
        healthy = report.is_healthy(),
        "connection diagnostic finished"
    );
    report
}
