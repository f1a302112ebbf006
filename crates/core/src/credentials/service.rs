//! Tenant credential management

use std::sync::Arc;

use ksef_domain::{
    mask_token, normalize_nip, validate_api_token, CompanyCredential, KsefEnvironment, KsefError,
    Result,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ports::CredentialStore;

/// What the operator sees about a stored token. Never carries the token
/// itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenReport {
    pub tenant_id: String,
    pub masked_token: String,
    pub token_length: usize,
    pub environment: KsefEnvironment,
    pub warnings: Vec<String>,
}

/// Seller details entered by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyDetails {
    pub company_name: String,
    pub tax_id: String,
    pub street: String,
    pub zip_code: String,
    pub city: String,
}

/// Reads and updates per-tenant credentials.
pub struct CredentialService {
    store: Arc<dyn CredentialStore>,
}

impl CredentialService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Store `raw_token` for `tenant_id`, creating the credential if needed.
    ///
    /// # Errors
    /// `InvalidInput` when the trimmed token is shorter than 20 characters.
    pub fn set_token(
        &self,
        tenant_id: &str,
        raw_token: &str,
        environment: KsefEnvironment,
    ) -> Result<TokenReport> {
        let token = validate_api_token(raw_token)?;

        let mut credential = self.load_or_empty(tenant_id)?;
        credential.ksef_token = Some(token);
        credential.ksef_environment = environment;
        self.store.save(&credential)?;

        info!(
            tenant_id,
            environment = %environment,
            token = %credential.masked_token().unwrap_or_default(),
            "KSeF token updated"
        );
        Ok(token_report(&credential, raw_token.trim()))
    }

    /// Masked view of the stored token, if any.
    pub fn show_token(&self, tenant_id: &str) -> Result<Option<TokenReport>> {
        Ok(self.store.load(tenant_id)?.and_then(|credential| {
            credential.ksef_token.as_deref().map(|token| token_report(&credential, token))
        }))
    }

    /// Remove the token but keep the company profile.
    ///
    /// # Returns
    /// `false` when there was no token to clear.
    pub fn clear_token(&self, tenant_id: &str) -> Result<bool> {
        let Some(mut credential) = self.store.load(tenant_id)? else {
            return Ok(false);
        };
        if credential.ksef_token.take().is_none() {
            return Ok(false);
        }
        self.store.save(&credential)?;
        info!(tenant_id, "KSeF token cleared");
        Ok(true)
    }

    /// Store seller details. The NIP is normalized to ten digits.
    ///
    /// # Errors
    /// `Config` for a malformed NIP, `InvalidInput` for an empty name.
    pub fn update_company(
        &self,
        tenant_id: &str,
        details: &CompanyDetails,
    ) -> Result<CompanyCredential> {
        let nip = normalize_nip(&details.tax_id)?;
        let name = details.company_name.trim();
        if name.is_empty() {
            return Err(KsefError::InvalidInput("company name must not be empty".into()));
        }

        let mut credential = self.load_or_empty(tenant_id)?;
        credential.company_name = name.to_string();
        credential.tax_id = Some(nip);
        credential.street = details.street.trim().to_string();
        credential.zip_code = details.zip_code.trim().to_string();
        credential.city = details.city.trim().to_string();
        self.store.save(&credential)?;

        info!(tenant_id, nip = ?credential.tax_id, "company profile updated");
        Ok(credential)
    }

    fn load_or_empty(&self, tenant_id: &str) -> Result<CompanyCredential> {
        Ok(self.store.load(tenant_id)?.unwrap_or_else(|| CompanyCredential::empty(tenant_id)))
    }
}

fn token_report(credential: &CompanyCredential, token: &str) -> TokenReport {
    let mut warnings = Vec::new();
    if credential.tax_id.as_deref().map_or(true, str::is_empty) {
        warnings.push("company NIP is not set; run `company set` before submitting".to_string());
    }
    if credential.company_name.trim().is_empty() {
        warnings.push("company name is not set".to_string());
    }

    TokenReport {
        tenant_id: credential.tenant_id.clone(),
        masked_token: mask_token(token),
        token_length: token.chars().count(),
        environment: credential.ksef_environment,
        warnings,
    }
}
