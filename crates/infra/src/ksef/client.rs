//! Blocking KSeF REST adapter

use std::sync::Arc;
use std::time::Duration;

use ksef_core::{
    AuthChallenge, KsefApi, KsefApiFactory, PublicKeyCertificate, SendInvoiceResponse,
    SessionStatus, TokenAuthRequest,
};
use ksef_domain::{KsefConfig, KsefEnvironment, KsefError, Result};
use reqwest::blocking::Response;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::http::HttpClient;

const USER_AGENT: &str = concat!("ksef-bridge/", env!("CARGO_PKG_VERSION"));
const SESSION_TOKEN_HEADER: &str = "SessionToken";
const INVOICE_CONTENT_TYPE: &str = "application/octet-stream; charset=utf-8";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChallengeRequest<'a> {
    context_identifier: ChallengeContext<'a>,
}

#[derive(Serialize)]
struct ChallengeContext<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    identifier: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionTokenEnvelope {
    session_token: SessionTokenBody,
}

#[derive(Deserialize)]
struct SessionTokenBody {
    token: String,
}

/// [`KsefApi`] over HTTP for one environment. Requests are never retried.
pub struct KsefHttpClient {
    base_url: String,
    http: HttpClient,
    send_http: HttpClient,
}

impl KsefHttpClient {
    /// # Errors
    /// `Network` when the underlying HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        http_timeout: Duration,
        send_timeout: Duration,
    ) -> Result<Self> {
        let build = |timeout: Duration| {
            HttpClient::builder().timeout(timeout).user_agent(USER_AGENT).build()
        };

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: build(http_timeout)?,
            send_http: build(send_timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /security/public-key-certificates`. Only used for diagnostics.
    pub fn public_key_certificates(&self) -> Result<Vec<PublicKeyCertificate>> {
        let url = self.url("/security/public-key-certificates");
        let response = self.http.send(self.http.request(Method::GET, url))?;
        read_json(response, "public key certificates", KsefError::Network)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl KsefApi for KsefHttpClient {
    fn request_challenge(&self, nip: &str) -> Result<AuthChallenge> {
        let body = ChallengeRequest {
            context_identifier: ChallengeContext { kind: "NIP", identifier: nip },
        };
        let request = self.http.request(Method::POST, self.url("/auth/challenge")).json(&body);

        let response = self.http.send(request)?;
        read_json(response, "challenge", KsefError::SessionInit)
    }

    fn authenticate(&self, request: &TokenAuthRequest) -> Result<String> {
        let builder = self.http.request(Method::POST, self.url("/auth/ksef-token")).json(request);

        let response = self.http.send(builder)?;
        let envelope: SessionTokenEnvelope =
            read_json(response, "token authentication", KsefError::SessionInit)?;
        Ok(envelope.session_token.token)
    }

    fn send_invoice(&self, session_token: &str, invoice_xml: &[u8]) -> Result<SendInvoiceResponse> {
        let builder = self
            .send_http
            .request(Method::PUT, self.url("/online/v2/Invoice/Send"))
            .header(CONTENT_TYPE, INVOICE_CONTENT_TYPE)
            .header(SESSION_TOKEN_HEADER, session_token)
            .body(invoice_xml.to_vec());

        debug!(bytes = invoice_xml.len(), "uploading invoice document");
        let response = self.send_http.send(builder)?;
        read_json(response, "invoice send", KsefError::Submission)
    }

    fn session_status(&self, session_token: &str, session_id: &str) -> Result<SessionStatus> {
        let url = self.url(&format!("/online/Session/Status/{session_id}"));
        let builder =
            self.http.request(Method::GET, url).header(SESSION_TOKEN_HEADER, session_token);

        let response = self.http.send(builder)?;
        read_json(response, "session status", KsefError::Network)
    }
}

/// Non-2xx responses become `kind` carrying the remote body.
fn read_json<T: DeserializeOwned>(
    response: Response,
    step: &str,
    kind: fn(String) -> KsefError,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        warn!(step, status = status.as_u16(), "KSeF API returned an error");
        return Err(kind(format!("KSeF API error (HTTP {}): {}", status.as_u16(), body.trim())));
    }

    response.json::<T>().map_err(|err| kind(format!("unexpected {step} response: {err}")))
}

/// Builds a fresh [`KsefHttpClient`] for every operation.
pub struct KsefHttpConnector {
    config: KsefConfig,
}

impl KsefHttpConnector {
    pub fn new(config: KsefConfig) -> Self {
        Self { config }
    }

    /// Base URL for `environment`, honoring the configured override.
    pub fn base_url(&self, environment: KsefEnvironment) -> String {
        self.config
            .base_url_override
            .clone()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| environment.base_url().to_string())
    }

    /// Concrete client, also used by the connection diagnostic.
    pub fn client(&self, environment: KsefEnvironment) -> Result<KsefHttpClient> {
        KsefHttpClient::new(
            self.base_url(environment),
            Duration::from_secs(self.config.http_timeout_secs),
            Duration::from_secs(self.config.send_timeout_secs),
        )
    }
}

impl KsefApiFactory for KsefHttpConnector {
    fn connect(&self, environment: KsefEnvironment) -> Result<Arc<dyn KsefApi>> {
        Ok(Arc::new(self.client(environment)?))
    }
}
