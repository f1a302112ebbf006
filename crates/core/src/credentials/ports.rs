//! Port interfaces for tenant credentials

use ksef_domain::{CompanyCredential, Result};

/// Persistence for per-tenant KSeF credentials.
pub trait CredentialStore: Send + Sync {
    /// Load the credential of a tenant, if it was ever configured.
    fn load(&self, tenant_id: &str) -> Result<Option<CompanyCredential>>;

    /// Insert or update the credential of `credential.tenant_id`.
    fn save(&self, credential: &CompanyCredential) -> Result<()>;
}
