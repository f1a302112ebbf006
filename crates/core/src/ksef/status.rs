//! Polling of asynchronous KSeF processing outcomes

use std::fmt;
use std::sync::Arc;

use ksef_domain::constants::{PROCESSING_CODE_ERROR_FLOOR, PROCESSING_CODE_SUCCESS};
use ksef_domain::{
    truncate_description, CompanyCredential, Invoice, KsefError, KsefStatus, Result,
    SubmissionState,
};
use serde::Serialize;
use tracing::{info, warn};

use super::ports::{KsefApiFactory, SessionStatus, TokenEncryptor};
use super::session::SessionNegotiator;
use crate::credentials::ports::CredentialStore;
use crate::invoices::ports::{InvoiceRepository, InvoiceStateStore};

/// Severity of a status check result, mirrored by the CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeLevel {
    Success,
    Warning,
    Info,
    Error,
}

impl fmt::Display for OutcomeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "OK",
            Self::Warning => "WARN",
            Self::Info => "INFO",
            Self::Error => "ERROR",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCheckOutcome {
    pub invoice_id: i64,
    /// Absent when the invoice could not be loaded.
    pub invoice_number: Option<String>,
    pub level: OutcomeLevel,
    pub message: String,
}

/// Checks the processing status of submitted invoices.
pub struct StatusPoller {
    invoices: Arc<dyn InvoiceRepository>,
    state: Arc<dyn InvoiceStateStore>,
    credentials: Arc<dyn CredentialStore>,
    api_factory: Arc<dyn KsefApiFactory>,
    encryptor: Arc<dyn TokenEncryptor>,
}

impl StatusPoller {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        state: Arc<dyn InvoiceStateStore>,
        credentials: Arc<dyn CredentialStore>,
        api_factory: Arc<dyn KsefApiFactory>,
        encryptor: Arc<dyn TokenEncryptor>,
    ) -> Self {
        Self { invoices, state, credentials, api_factory, encryptor }
    }

    /// Check several invoices one after another. A failure on one invoice is
    /// reported in its own outcome and does not stop the others.
    pub fn check_many(&self, invoice_ids: &[i64]) -> Vec<StatusCheckOutcome> {
        invoice_ids.iter().map(|id| self.check_status(*id)).collect()
    }

    /// Query KSeF for one invoice and apply the result.
    pub fn check_status(&self, invoice_id: i64) -> StatusCheckOutcome {
        let invoice = match self.invoices.get_invoice(invoice_id) {
            Ok(Some(invoice)) => invoice,
            Ok(None) => {
                return StatusCheckOutcome {
                    invoice_id,
                    invoice_number: None,
                    level: OutcomeLevel::Error,
                    message: "invoice not found".to_string(),
                }
            }
            Err(err) => {
                return StatusCheckOutcome {
                    invoice_id,
                    invoice_number: None,
                    level: OutcomeLevel::Error,
                    message: err.to_string(),
                }
            }
        };

        let outcome = |level, message: String| StatusCheckOutcome {
            invoice_id,
            invoice_number: Some(invoice.invoice_number.clone()),
            level,
            message,
        };

        if !invoice.submission.status.is_awaiting_outcome() {
            return outcome(
                OutcomeLevel::Warning,
                format!(
                    "invoice {} is not awaiting processing (status: {})",
                    invoice.invoice_number, invoice.submission.status
                ),
            );
        }
        let Some(session_id) = invoice.submission.session_id.clone() else {
            return outcome(
                OutcomeLevel::Warning,
                format!("invoice {} has no stored session id", invoice.invoice_number),
            );
        };

        match self.poll(&invoice, &session_id) {
            Ok((level, message)) => outcome(level, message),
            Err(err) => {
                warn!(
                    invoice_id,
                    error_type = err.label(),
                    error = %err,
                    "status check failed"
                );
                outcome(
                    OutcomeLevel::Error,
                    format!(
                        "status check for invoice {} failed: {}",
                        invoice.invoice_number,
                        truncate_description(&err.to_string())
                    ),
                )
            }
        }
    }

    fn poll(&self, invoice: &Invoice, session_id: &str) -> Result<(OutcomeLevel, String)> {
        let credential = self.load_credential(&invoice.tenant_id)?;
        let api = self.api_factory.connect(credential.ksef_environment)?;
        let negotiator = SessionNegotiator::new(api.clone(), self.encryptor.clone(), &credential)?;
        let session_token = negotiator.ensure_session()?;

        let status = api.session_status(session_token, session_id)?;
        info!(
            invoice_id = invoice.id,
            processing_code = status.processing_code,
            "received KSeF processing status"
        );
        self.apply(invoice, status)
    }

    fn apply(&self, invoice: &Invoice, status: SessionStatus) -> Result<(OutcomeLevel, String)> {
        let current = invoice.submission.status;
        let description = status.processing_description.as_deref().map(truncate_description);
        let number = &invoice.invoice_number;

        let (next, level, message) = if status.processing_code == PROCESSING_CODE_SUCCESS {
            let reference = invoice
                .submission
                .reference_number
                .clone()
                .or(status.element_reference_number.clone());
            match reference {
                Some(reference) => (
                    SubmissionState {
                        reference_number: Some(reference.clone()),
                        status: KsefStatus::Processed,
                        processing_description: description,
                        ..invoice.submission.clone()
                    },
                    OutcomeLevel::Success,
                    format!("invoice {number} processed. KSeF number: {reference}"),
                ),
                None => (
                    SubmissionState {
                        status: KsefStatus::Processed,
                        processing_description: description,
                        ..invoice.submission.clone()
                    },
                    OutcomeLevel::Warning,
                    format!("invoice {number} processed without reference number"),
                ),
            }
        } else if status.processing_code >= PROCESSING_CODE_ERROR_FLOOR {
            let detail = description.clone().unwrap_or_else(|| "no description".to_string());
            (
                SubmissionState {
                    status: KsefStatus::Error,
                    processing_description: description,
                    ..invoice.submission.clone()
                },
                OutcomeLevel::Error,
                format!("invoice {number} processing failed: {detail}"),
            )
        } else {
            (
                SubmissionState {
                    processing_description: description.or(invoice
                        .submission
                        .processing_description
                        .clone()),
                    ..invoice.submission.clone()
                },
                OutcomeLevel::Info,
                format!(
                    "invoice {number} is still being processed (code {})",
                    status.processing_code
                ),
            )
        };

        if next.status != current && !current.can_transition_to(next.status) {
            return Err(KsefError::Internal(format!(
                "refusing status change {current} -> {} for invoice {number}",
                next.status
            )));
        }
        if !self.state.transition(invoice.id, current, &next)? {
            return Err(KsefError::Internal(format!(
                "invoice {number} changed state during the status check"
            )));
        }

        Ok((level, message))
    }

    fn load_credential(&self, tenant_id: &str) -> Result<CompanyCredential> {
        self.credentials.load(tenant_id)?.ok_or_else(|| {
            KsefError::Config(format!("no company credentials configured for tenant '{tenant_id}'"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_with_lowercase_level() {
        let outcome = StatusCheckOutcome {
            invoice_id: 7,
            invoice_number: Some("FV/7".into()),
            level: OutcomeLevel::Warning,
            message: "invoice FV/7 processed without reference number".into(),
        };

        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["level"], "warning");
        assert_eq!(json["invoice_number"], "FV/7");
        assert_eq!(OutcomeLevel::Warning.to_string(), "WARN");
    }
}
