//! KSeF remote API port interfaces
//!
//! The services in this crate talk to KSeF only through these traits. The
//! blocking HTTP implementation lives in `ksef-infra`.

use std::sync::Arc;

use ksef_domain::{KsefEnvironment, Result};
use serde::{Deserialize, Serialize};

/// Server-issued challenge from `POST /auth/challenge`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthChallenge {
    pub challenge: String,
    /// Opaque timestamp string; echoed verbatim into the encrypted payload.
    pub timestamp: String,
}

/// Body of `POST /auth/ksef-token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAuthRequest {
    pub challenge: String,
    pub context_identifier: ContextIdentifier,
    pub encrypted_token: String,
}

/// `{type: "NIP", value: <nip>}` context used by the token auth call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl ContextIdentifier {
    pub fn nip(value: impl Into<String>) -> Self {
        Self { kind: "NIP".to_string(), value: value.into() }
    }
}

/// Result of the invoice Send call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendInvoiceResponse {
    /// Identifier used to poll the processing status.
    pub element_reference_number: String,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub processing_status: Option<String>,
    #[serde(default)]
    pub processing_description: Option<String>,
}

impl SendInvoiceResponse {
    /// The remote accepted the request but reported a processing error.
    pub fn is_rejected(&self) -> bool {
        self.processing_status.as_deref().is_some_and(|status| status.eq_ignore_ascii_case("ERROR"))
    }
}

/// Asynchronous processing outcome returned by the session status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub processing_code: i64,
    #[serde(default)]
    pub processing_description: Option<String>,
    #[serde(default)]
    pub element_reference_number: Option<String>,
}

/// One entry of `GET /security/public-key-certificates`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCertificate {
    /// Base64 DER certificate.
    pub certificate: String,
    #[serde(default)]
    pub usage: Vec<String>,
    #[serde(default)]
    pub valid_from: Option<String>,
    #[serde(default)]
    pub valid_to: Option<String>,
}

/// Raw KSeF calls. Each call is a single blocking request without retries.
pub trait KsefApi: Send + Sync {
    /// Request a challenge for the given NIP context.
    fn request_challenge(&self, nip: &str) -> Result<AuthChallenge>;

    /// Exchange the encrypted token for a session token.
    fn authenticate(&self, request: &TokenAuthRequest) -> Result<String>;

    /// Upload raw invoice XML within an authenticated session.
    fn send_invoice(&self, session_token: &str, invoice_xml: &[u8]) -> Result<SendInvoiceResponse>;

    /// Query the processing outcome keyed by session identifier.
    fn session_status(&self, session_token: &str, session_id: &str) -> Result<SessionStatus>;
}

/// Creates a fresh [`KsefApi`] per operation so no client state is shared
/// between requests.
pub trait KsefApiFactory: Send + Sync {
    fn connect(&self, environment: KsefEnvironment) -> Result<Arc<dyn KsefApi>>;
}

/// Encrypts `"{token}|{timestamp}"` for the token auth call.
pub trait TokenEncryptor: Send + Sync {
    /// Returns the base64 ciphertext. Implementations must not log or retain
    /// the plaintext or the result.
    fn encrypt(&self, api_token: &str, server_timestamp: &str) -> Result<String>;
}
