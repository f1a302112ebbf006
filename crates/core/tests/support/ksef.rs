//! Scripted KSeF API fakes
//!
//! Every call is recorded so tests can assert exactly which remote requests
//! were made, including none at all.

use std::sync::Arc;

use ksef_core::{
    AuthChallenge, KsefApi, KsefApiFactory, SendInvoiceResponse, SessionStatus, TokenAuthRequest,
    TokenEncryptor,
};
use ksef_domain::{KsefEnvironment, KsefError, Result as DomainResult};
use parking_lot::Mutex;

pub const SESSION_TOKEN: &str = "session-token-abc";

/// Fake remote API. Unscripted sends are accepted with element reference
/// `ELEM-1`; unscripted status queries report code 310 (in progress).
#[derive(Default)]
pub struct FakeKsefApi {
    calls: Mutex<Vec<String>>,
    auth_error: Mutex<Option<KsefError>>,
    send_result: Mutex<Option<DomainResult<SendInvoiceResponse>>>,
    status_result: Mutex<Option<DomainResult<SessionStatus>>>,
    sent_documents: Mutex<Vec<String>>,
}

impl FakeKsefApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_authentication(&self, err: KsefError) {
        *self.auth_error.lock() = Some(err);
    }

    pub fn respond_to_send(&self, result: DomainResult<SendInvoiceResponse>) {
        *self.send_result.lock() = Some(result);
    }

    pub fn respond_to_status(&self, result: DomainResult<SessionStatus>) {
        *self.status_result.lock() = Some(result);
    }

    /// Names of the remote calls made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn sent_documents(&self) -> Vec<String> {
        self.sent_documents.lock().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }
}

pub fn accepted(element_reference: &str) -> SendInvoiceResponse {
    SendInvoiceResponse {
        element_reference_number: element_reference.to_string(),
        reference_number: None,
        processing_status: Some("ACCEPTED".into()),
        processing_description: None,
    }
}

pub fn status(code: i64, description: &str, reference: Option<&str>) -> SessionStatus {
    SessionStatus {
        processing_code: code,
        processing_description: Some(description.to_string()),
        element_reference_number: reference.map(str::to_string),
    }
}

impl KsefApi for FakeKsefApi {
    fn request_challenge(&self, _nip: &str) -> DomainResult<AuthChallenge> {
        self.record("challenge");
        Ok(AuthChallenge {
            challenge: "20240501-CR-0123456789ABCDEF".into(),
            timestamp: "2024-05-01T08:00:00.000Z".into(),
        })
    }

    fn authenticate(&self, _request: &TokenAuthRequest) -> DomainResult<String> {
        self.record("authenticate");
        match self.auth_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(SESSION_TOKEN.to_string()),
        }
    }

    fn send_invoice(
        &self,
        session_token: &str,
        invoice_xml: &[u8],
    ) -> DomainResult<SendInvoiceResponse> {
        self.record("send");
        assert_eq!(session_token, SESSION_TOKEN);
        self.sent_documents.lock().push(String::from_utf8_lossy(invoice_xml).into_owned());
        self.send_result.lock().clone().unwrap_or_else(|| Ok(accepted("ELEM-1")))
    }

    fn session_status(
        &self,
        session_token: &str,
        _session_id: &str,
    ) -> DomainResult<SessionStatus> {
        self.record("status");
        assert_eq!(session_token, SESSION_TOKEN);
        self.status_result
            .lock()
            .clone()
            .unwrap_or_else(|| Ok(status(310, "Invoice is being processed", None)))
    }
}

/// Hands out the same fake for every connection and counts connections.
pub struct FakeApiFactory {
    api: Arc<FakeKsefApi>,
    connections: Mutex<Vec<KsefEnvironment>>,
}

impl FakeApiFactory {
    pub fn new(api: Arc<FakeKsefApi>) -> Self {
        Self { api, connections: Mutex::new(Vec::new()) }
    }

    pub fn connections(&self) -> Vec<KsefEnvironment> {
        self.connections.lock().clone()
    }
}

impl KsefApiFactory for FakeApiFactory {
    fn connect(&self, environment: KsefEnvironment) -> DomainResult<Arc<dyn KsefApi>> {
        self.connections.lock().push(environment);
        Ok(self.api.clone())
    }
}

/// Deterministic stand-in for RSA encryption.
pub struct FakeEncryptor;

impl TokenEncryptor for FakeEncryptor {
    fn encrypt(&self, api_token: &str, server_timestamp: &str) -> DomainResult<String> {
        Ok(format!("encrypted({}|{server_timestamp})", api_token.len()))
    }
}

/// Encryptor whose key file is missing.
pub struct MissingKeyEncryptor;

impl TokenEncryptor for MissingKeyEncryptor {
    fn encrypt(&self, _api_token: &str, _server_timestamp: &str) -> DomainResult<String> {
        Err(KsefError::Config("public key file not found: keys/ksef_public_key.pem".into()))
    }
}
