//! Application context - dependency injection container

use std::fs;
use std::path::Path;
use std::sync::Arc;

use ksef_core::{
    CounterpartyStore, CredentialService, CredentialStore, InvoiceRepository, InvoiceStateStore,
    JpkExporter, JpkImporter, KsefApiFactory, StatusPoller, SubmissionOrchestrator,
    TokenEncryptor,
};
use ksef_domain::{Config, KsefError, Result};
use ksef_infra::{
    DbManager, KsefHttpConnector, PemFileTokenEncryptor, SqliteCounterpartyRepository,
    SqliteCredentialRepository, SqliteInvoiceRepository,
};
use tracing::info;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub invoices: Arc<dyn InvoiceRepository>,
    pub counterparties: Arc<dyn CounterpartyStore>,
    pub credential_store: Arc<dyn CredentialStore>,
    pub connector: Arc<KsefHttpConnector>,

    pub credentials: CredentialService,
    pub submission: SubmissionOrchestrator,
    pub status: StatusPoller,
    pub importer: JpkImporter,
}

impl AppContext {
    /// Open the database, apply migrations and wire every service.
    ///
    /// # Errors
    /// `Database`/`Security` when the database cannot be opened.
    pub fn new(config: Config) -> Result<Self> {
        ensure_parent_dir(Path::new(&config.database.path))?;

        let db = Arc::new(DbManager::new(
            &config.database.path,
            config.database.pool_size,
            config.database.encryption_key.as_deref(),
        )?);
        db.run_migrations()?;

        let invoice_repo = Arc::new(SqliteInvoiceRepository::new(Arc::clone(&db)));
        let invoices: Arc<dyn InvoiceRepository> = invoice_repo.clone();
        let state: Arc<dyn InvoiceStateStore> = invoice_repo;
        let counterparties: Arc<dyn CounterpartyStore> =
            Arc::new(SqliteCounterpartyRepository::new(Arc::clone(&db)));
        let credential_store: Arc<dyn CredentialStore> =
            Arc::new(SqliteCredentialRepository::new(Arc::clone(&db)));

        let connector = Arc::new(KsefHttpConnector::new(config.ksef.clone()));
        let api_factory: Arc<dyn KsefApiFactory> = connector.clone();
        let encryptor: Arc<dyn TokenEncryptor> =
            Arc::new(PemFileTokenEncryptor::new(&config.ksef.public_key_path));

        let submission = SubmissionOrchestrator::new(
            Arc::clone(&invoices),
            Arc::clone(&state),
            Arc::clone(&counterparties),
            Arc::clone(&credential_store),
            Arc::clone(&api_factory),
            Arc::clone(&encryptor),
        )
        .with_system_info(config.ksef.system_info.clone());

        let status = StatusPoller::new(
            Arc::clone(&invoices),
            state,
            Arc::clone(&credential_store),
            api_factory,
            encryptor,
        );

        let importer = JpkImporter::new(Arc::clone(&invoices), Arc::clone(&counterparties));

        info!(db_path = %db.path().display(), "application context ready");

        Ok(Self {
            config,
            db,
            invoices,
            counterparties,
            credentials: CredentialService::new(Arc::clone(&credential_store)),
            credential_store,
            connector,
            submission,
            status,
            importer,
        })
    }

    /// JPK exporter, optionally with a tenant-specific tax office code.
    pub fn jpk_exporter(&self, tax_office_code: Option<&str>) -> JpkExporter {
        let exporter = JpkExporter::new(
            Arc::clone(&self.invoices),
            Arc::clone(&self.counterparties),
            Arc::clone(&self.credential_store),
        );
        match tax_office_code {
            Some(code) => exporter.with_tax_office_code(code),
            None => exporter,
        }
    }
}

fn ensure_parent_dir(db_path: &Path) -> Result<()> {
    match db_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            fs::create_dir_all(parent).map_err(|err| {
                KsefError::Config(format!(
                    "cannot create database directory {}: {err}",
                    parent.display()
                ))
            })
        }
        _ => Ok(()),
    }
}
