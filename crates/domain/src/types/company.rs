//! Tenant credentials and counterparties

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{KSEF_PRODUCTION_BASE_URL, KSEF_TEST_BASE_URL};
use crate::impl_domain_status_conversions;
use crate::utils::validation::mask_token;

/// KSeF environment selector stored with each credential.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KsefEnvironment {
    #[default]
    Test,
    #[serde(alias = "prod")]
    Production,
}

impl_domain_status_conversions!(KsefEnvironment {
    Test => "test",
    Production => "production",
} aliases {
    "prod" => Production,
});

impl KsefEnvironment {
    /// Public API root for this environment.
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Test => KSEF_TEST_BASE_URL,
            Self::Production => KSEF_PRODUCTION_BASE_URL,
        }
    }
}

/// Per-tenant KSeF credential and seller profile.
///
/// Created lazily on first configuration. The record is never deleted; only
/// the token is cleared.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyCredential {
    pub tenant_id: String,
    pub company_name: String,
    pub tax_id: Option<String>,
    pub street: String,
    pub zip_code: String,
    pub city: String,
    #[serde(skip_serializing)]
    pub ksef_token: Option<String>,
    pub ksef_environment: KsefEnvironment,
}

impl CompanyCredential {
    /// Blank credential for a tenant that has not been configured yet.
    pub fn empty(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            company_name: String::new(),
            tax_id: None,
            street: String::new(),
            zip_code: String::new(),
            city: String::new(),
            ksef_token: None,
            ksef_environment: KsefEnvironment::default(),
        }
    }

    /// Masked token for display, if one is stored.
    pub fn masked_token(&self) -> Option<String> {
        self.ksef_token.as_deref().map(mask_token)
    }
}

impl fmt::Debug for CompanyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompanyCredential")
            .field("tenant_id", &self.tenant_id)
            .field("company_name", &self.company_name)
            .field("tax_id", &self.tax_id)
            .field("ksef_token", &self.masked_token())
            .field("ksef_environment", &self.ksef_environment)
            .finish_non_exhaustive()
    }
}

/// Buyer of an invoice. `tax_id` is absent for buyers identified by name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub id: i64,
    pub tenant_id: String,
    pub name: String,
    pub tax_id: Option<String>,
    pub street: String,
    pub zip_code: String,
    pub city: String,
}

/// Counterparty fields before the repository assigns an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCounterparty {
    pub tenant_id: String,
    pub name: String,
    pub tax_id: Option<String>,
    pub street: String,
    pub zip_code: String,
    pub city: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_accepts_prod_alias() {
        assert_eq!("prod".parse::<KsefEnvironment>().unwrap(), KsefEnvironment::Production);
        assert_eq!(KsefEnvironment::Production.to_string(), "production");
        assert_eq!(KsefEnvironment::Test.base_url(), "https://ksef-test.mf.gov.pl/api/v2");
    }

    #[test]
    fn serialization_never_contains_token() {
        let mut credential = CompanyCredential::empty("acme");
        credential.ksef_token = Some("0123456789ABCDEFGHIJ0123456789".into());
        let json = serde_json::to_string(&credential).unwrap();
        assert!(!json.contains("ABCDEFGHIJ"));
        assert_eq!(credential.masked_token().unwrap(), "0123456789...0123456789");
    }

    #[test]
    fn debug_output_masks_token() {
        let mut credential = CompanyCredential::empty("acme");
        credential.ksef_token = Some("0123456789ABCDEFGHIJ0123456789".into());
        let debug = format!("{credential:?}");
        assert!(!debug.contains("ABCDEFGHIJ"));
        assert!(debug.contains("0123456789...0123456789"));
    }
}
