//! Shared test helpers for `ksef-core` integration tests.
//!
//! Not every test binary uses every helper.
#![allow(dead_code)]

pub mod ksef;
pub mod repositories;

use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use ksef_core::{
    CredentialService, JpkExporter, JpkImporter, StatusPoller, SubmissionOrchestrator,
    TokenEncryptor,
};
use ksef_domain::{
    CompanyCredential, Invoice, InvoiceItem, KsefEnvironment, NewCounterparty, NewInvoice,
};
use rust_decimal::Decimal;

use self::ksef::{FakeApiFactory, FakeEncryptor, FakeKsefApi};
use self::repositories::{MockCounterpartyStore, MockCredentialStore, MockInvoiceRepository};

pub const TENANT: &str = "acme";
pub const VALID_TOKEN: &str = "20240501-EC-0123456789ABCDEF-XYZ";

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

/// Fully configured seller for [`TENANT`].
pub fn company() -> CompanyCredential {
    CompanyCredential {
        company_name: "Acme Sp. z o.o.".into(),
        tax_id: Some("5260001246".into()),
        street: "ul. Prosta 1".into(),
        zip_code: "00-001".into(),
        city: "Warszawa".into(),
        ksef_token: Some(VALID_TOKEN.into()),
        ksef_environment: KsefEnvironment::Test,
        ..CompanyCredential::empty(TENANT)
    }
}

/// All fakes wired together the way the CLI context wires real adapters.
pub struct Harness {
    pub invoices: Arc<MockInvoiceRepository>,
    pub counterparties: Arc<MockCounterpartyStore>,
    pub credentials: Arc<MockCredentialStore>,
    pub api: Arc<FakeKsefApi>,
    pub factory: Arc<FakeApiFactory>,
    pub encryptor: Arc<dyn TokenEncryptor>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_company(company())
    }

    pub fn with_company(credential: CompanyCredential) -> Self {
        let api = FakeKsefApi::new();
        Self {
            invoices: Arc::new(MockInvoiceRepository::default()),
            counterparties: Arc::new(MockCounterpartyStore::default()),
            credentials: Arc::new(MockCredentialStore::with(credential)),
            factory: Arc::new(FakeApiFactory::new(api.clone())),
            api,
            encryptor: Arc::new(FakeEncryptor),
        }
    }

    pub fn with_encryptor(mut self, encryptor: Arc<dyn TokenEncryptor>) -> Self {
        self.encryptor = encryptor;
        self
    }

    pub fn orchestrator(&self) -> SubmissionOrchestrator {
        SubmissionOrchestrator::new(
            self.invoices.clone(),
            self.invoices.clone(),
            self.counterparties.clone(),
            self.credentials.clone(),
            self.factory.clone(),
            self.encryptor.clone(),
        )
    }

    pub fn poller(&self) -> StatusPoller {
        StatusPoller::new(
            self.invoices.clone(),
            self.invoices.clone(),
            self.credentials.clone(),
            self.factory.clone(),
            self.encryptor.clone(),
        )
    }

    pub fn importer(&self) -> JpkImporter {
        JpkImporter::new(self.invoices.clone(), self.counterparties.clone())
    }

    pub fn exporter(&self) -> JpkExporter {
        JpkExporter::new(
            self.invoices.clone(),
            self.counterparties.clone(),
            self.credentials.clone(),
        )
    }

    pub fn credential_service(&self) -> CredentialService {
        CredentialService::new(self.credentials.clone())
    }

    /// Seed an unsent invoice with one line and a buyer that has a NIP.
    pub fn seed_invoice(&self, number: &str) -> Invoice {
        let buyer = self.counterparties.seed(NewCounterparty {
            tenant_id: TENANT.into(),
            name: "Hurtownia \"Pod Lipą\" & Syn".into(),
            tax_id: Some("1112223344".into()),
            street: "ul. Lipowa 4".into(),
            zip_code: "31-100".into(),
            city: "Kraków".into(),
        });

        let mut invoice =
            NewInvoice::draft(TENANT, number, date("2024-05-02"), date("2024-05-02"), dec("0"));
        invoice.counterparty_id = Some(buyer.id);
        invoice.attach_items(vec![InvoiceItem::priced(
            "Konsultacje <IT>",
            dec("2"),
            "h",
            dec("150.00"),
        )]);
        self.invoices.seed(&invoice)
    }
}
