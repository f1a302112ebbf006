//! Challenge/response session negotiation
//!
//! A negotiator belongs to exactly one operation. The session token it obtains
//! is cached for the negotiator's lifetime and never refreshed; a new
//! operation builds a new negotiator and negotiates from scratch.

use std::fmt;
use std::sync::Arc;

use ksef_domain::{normalize_nip, validate_api_token, CompanyCredential, KsefError, Result};
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use super::ports::{ContextIdentifier, KsefApi, TokenAuthRequest, TokenEncryptor};

/// Obtains and caches a KSeF session token for one credential.
pub struct SessionNegotiator {
    api: Arc<dyn KsefApi>,
    encryptor: Arc<dyn TokenEncryptor>,
    nip: String,
    api_token: String,
    session_token: OnceCell<String>,
}

impl SessionNegotiator {
    /// Validate the credential and prepare a negotiator.
    ///
    /// # Errors
    /// `Config` when the token or NIP is missing or malformed,
    /// `InvalidInput` when the token is too short.
    pub fn new(
        api: Arc<dyn KsefApi>,
        encryptor: Arc<dyn TokenEncryptor>,
        credential: &CompanyCredential,
    ) -> Result<Self> {
        let raw_token = credential.ksef_token.as_deref().ok_or_else(|| {
            KsefError::Config(format!(
                "no KSeF token configured for tenant '{}'",
                credential.tenant_id
            ))
        })?;
        let api_token = validate_api_token(raw_token)?;
        let nip = normalize_nip(credential.tax_id.as_deref().unwrap_or_default())?;

        Ok(Self { api, encryptor, nip, api_token, session_token: OnceCell::new() })
    }

    /// Normalized NIP the session is bound to.
    pub fn nip(&self) -> &str {
        &self.nip
    }

    /// Return the cached session token, negotiating it on first use.
    ///
    /// # Errors
    /// `SessionInit` for transport or remote failures during either step,
    /// `Config` when the public key cannot be loaded.
    pub fn ensure_session(&self) -> Result<&str> {
        self.session_token.get_or_try_init(|| self.negotiate()).map(String::as_str)
    }

    fn negotiate(&self) -> Result<String> {
        let challenge = self
            .api
            .request_challenge(&self.nip)
            .map_err(|err| session_error("challenge request failed", err))?;

        debug!(
            challenge_prefix = %challenge.challenge.chars().take(20).collect::<String>(),
            "received KSeF challenge"
        );

        let encrypted_token = self
            .encryptor
            .encrypt(&self.api_token, &challenge.timestamp)
            .map_err(|err| session_error("token encryption failed", err))?;

        let request = TokenAuthRequest {
            challenge: challenge.challenge,
            context_identifier: ContextIdentifier::nip(self.nip.clone()),
            encrypted_token,
        };

        let token = self
            .api
            .authenticate(&request)
            .map_err(|err| session_error("token authentication failed", err))?;

        info!(nip = %self.nip, "KSeF session established");
        Ok(token)
    }
}

impl fmt::Debug for SessionNegotiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionNegotiator")
            .field("nip", &self.nip)
            .field("has_session", &self.session_token.get().is_some())
            .finish_non_exhaustive()
    }
}

/// Configuration problems pass through unchanged; everything else becomes a
/// `SessionInit` error.
fn session_error(step: &str, err: KsefError) -> KsefError {
    match err {
        KsefError::Config(_) | KsefError::SessionInit(_) => err,
        other => KsefError::SessionInit(format!("{step}: {other}")),
    }
}
