//! Invoice submission to KSeF

use std::sync::Arc;

use chrono::Utc;
use ksef_domain::constants::{DEFAULT_SYSTEM_INFO, SENT_DESCRIPTION};
use ksef_domain::{
    truncate_description, validate_api_token, CompanyCredential, Invoice, KsefError, KsefStatus,
    Result, SubmissionState,
};
use serde::Serialize;
use tracing::{error, info, warn};

use super::ports::{KsefApiFactory, TokenEncryptor};
use super::session::SessionNegotiator;
use crate::credentials::ports::CredentialStore;
use crate::document::InvoiceXmlBuilder;
use crate::invoices::ports::{CounterpartyStore, InvoiceRepository, InvoiceStateStore};

/// Result of one `submit` call, shown to the operator as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    pub invoice_id: i64,
    pub success: bool,
    pub message: String,
}

impl SubmissionOutcome {
    fn rejected(invoice_id: i64, message: impl Into<String>) -> Self {
        Self { invoice_id, success: false, message: message.into() }
    }
}

/// Sends one invoice at a time to KSeF and records the outcome.
///
/// Every call builds its own API client and session negotiator; nothing is
/// shared between submissions.
pub struct SubmissionOrchestrator {
    invoices: Arc<dyn InvoiceRepository>,
    state: Arc<dyn InvoiceStateStore>,
    counterparties: Arc<dyn CounterpartyStore>,
    credentials: Arc<dyn CredentialStore>,
    api_factory: Arc<dyn KsefApiFactory>,
    encryptor: Arc<dyn TokenEncryptor>,
    xml_builder: InvoiceXmlBuilder,
}

impl SubmissionOrchestrator {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        state: Arc<dyn InvoiceStateStore>,
        counterparties: Arc<dyn CounterpartyStore>,
        credentials: Arc<dyn CredentialStore>,
        api_factory: Arc<dyn KsefApiFactory>,
        encryptor: Arc<dyn TokenEncryptor>,
    ) -> Self {
        Self {
            invoices,
            state,
            counterparties,
            credentials,
            api_factory,
            encryptor,
            xml_builder: InvoiceXmlBuilder::new(DEFAULT_SYSTEM_INFO),
        }
    }

    /// Override the `SystemInfo` written into generated documents.
    pub fn with_system_info(mut self, system_info: impl Into<String>) -> Self {
        self.xml_builder = InvoiceXmlBuilder::new(system_info);
        self
    }

    /// Submit `invoice_id`.
    ///
    /// Never returns an error: failures are persisted as `error` status and
    /// reported through the outcome message.
    pub fn submit(&self, invoice_id: i64) -> SubmissionOutcome {
        let invoice = match self.invoices.get_invoice(invoice_id) {
            Ok(Some(invoice)) => invoice,
            Ok(None) => return SubmissionOutcome::rejected(invoice_id, "invoice not found"),
            Err(err) => {
                error!(invoice_id, error = %err, "failed to load invoice for submission");
                return SubmissionOutcome::rejected(
                    invoice_id,
                    truncate_description(&err.to_string()),
                );
            }
        };

        if let Some(reference) = invoice.submission.reference_number.as_deref() {
            info!(invoice_id, reference, "invoice already carries a KSeF reference; skipping");
            return SubmissionOutcome::rejected(
                invoice_id,
                format!(
                    "invoice {} already submitted (reference {reference})",
                    invoice.invoice_number
                ),
            );
        }

        if invoice.submission.status.is_awaiting_outcome() {
            return SubmissionOutcome::rejected(
                invoice_id,
                format!(
                    "invoice {} is awaiting processing, check status first",
                    invoice.invoice_number
                ),
            );
        }

        if !invoice.submission.status.can_transition_to(KsefStatus::Sent) {
            info!(
                invoice_id,
                status = %invoice.submission.status,
                "invoice cannot be sent from its current status; skipping"
            );
            return SubmissionOutcome::rejected(
                invoice_id,
                format!(
                    "invoice {} already processed (status: {})",
                    invoice.invoice_number, invoice.submission.status
                ),
            );
        }

        match self.send(&invoice) {
            Ok(outcome) => outcome,
            Err(err) => self.record_failure(&invoice, &err),
        }
    }

    fn send(&self, invoice: &Invoice) -> Result<SubmissionOutcome> {
        let credential = self.load_credential(&invoice.tenant_id)?;
        validate_api_token(credential.ksef_token.as_deref().unwrap_or_default())?;

        let counterparty = match invoice.counterparty_id {
            Some(id) => self.counterparties.get_counterparty(id)?,
            None => None,
        };
        let xml = self.xml_builder.build(invoice, &credential, counterparty.as_ref(), Utc::now())?;

        let api = self.api_factory.connect(credential.ksef_environment)?;
        let negotiator = SessionNegotiator::new(api.clone(), self.encryptor.clone(), &credential)?;
        let session_token = negotiator.ensure_session()?;

        let response = api.send_invoice(session_token, xml.as_bytes()).map_err(send_error)?;
        if response.is_rejected() {
            return Err(KsefError::Submission(
                response
                    .processing_description
                    .unwrap_or_else(|| "remote rejected the invoice".to_string()),
            ));
        }

        let description = response
            .processing_description
            .as_deref()
            .map(truncate_description)
            .unwrap_or_else(|| SENT_DESCRIPTION.to_string());
        let state = SubmissionState {
            reference_number: response.reference_number.clone(),
            status: KsefStatus::Sent,
            session_id: Some(response.element_reference_number.clone()),
            sent_at: Some(Utc::now()),
            processing_description: Some(description),
        };

        if !self.state.transition(invoice.id, invoice.submission.status, &state)? {
            return Err(KsefError::Internal(format!(
                "invoice {} changed state during submission",
                invoice.invoice_number
            )));
        }

        let reference =
            response.reference_number.as_deref().unwrap_or(&response.element_reference_number);
        info!(
            invoice_id = invoice.id,
            invoice_number = %invoice.invoice_number,
            reference,
            "invoice sent to KSeF"
        );

        Ok(SubmissionOutcome {
            invoice_id: invoice.id,
            success: true,
            message: format!("{SENT_DESCRIPTION}. Reference: {reference}"),
        })
    }

    fn load_credential(&self, tenant_id: &str) -> Result<CompanyCredential> {
        let credential = self.credentials.load(tenant_id)?.ok_or_else(|| {
            KsefError::Config(format!("no company credentials configured for tenant '{tenant_id}'"))
        })?;
        if credential.ksef_token.is_none() {
            return Err(KsefError::Config(format!(
                "no KSeF token configured for tenant '{tenant_id}'"
            )));
        }
        Ok(credential)
    }

    fn record_failure(&self, invoice: &Invoice, err: &KsefError) -> SubmissionOutcome {
        let message = truncate_description(&err.to_string());
        warn!(
            invoice_id = invoice.id,
            invoice_number = %invoice.invoice_number,
            error_type = err.label(),
            "invoice submission failed"
        );

        let state = SubmissionState {
            status: KsefStatus::Error,
            processing_description: Some(message.clone()),
            ..invoice.submission.clone()
        };
        match self.state.transition(invoice.id, invoice.submission.status, &state) {
            Ok(true) => {}
            Ok(false) => {
                warn!(invoice_id = invoice.id, "error status not recorded; state changed");
            }
            Err(write_err) => {
                error!(
                    invoice_id = invoice.id,
                    error = %write_err,
                    "failed to record submission error"
                );
            }
        }

        SubmissionOutcome::rejected(invoice.id, message)
    }
}

fn send_error(err: KsefError) -> KsefError {
    match err {
        KsefError::Submission(_) => err,
        other => KsefError::Submission(other.to_string()),
    }
}
