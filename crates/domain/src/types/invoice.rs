//! Invoice entity and its KSeF submission state

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAYMENT_METHOD, DEFAULT_PAYMENT_TERM_DAYS};
use crate::impl_domain_status_conversions;

/// Local view of where an invoice is in the KSeF pipeline.
///
/// Transitions only move forward (`unsent` → `sent` → `processing` →
/// `processed`). `error` is reachable from every state, and an errored
/// invoice may be sent again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KsefStatus {
    #[default]
    Unsent,
    Sent,
    Processing,
    Processed,
    Error,
}

impl_domain_status_conversions!(KsefStatus {
    Unsent => "unsent",
    Sent => "sent",
    Processing => "processing",
    Processed => "processed",
    Error => "error",
});

impl KsefStatus {
    fn rank(self) -> u8 {
        match self {
            Self::Unsent => 0,
            Self::Sent => 1,
            Self::Processing => 2,
            Self::Processed => 3,
            Self::Error => 4,
        }
    }

    /// Whether moving from `self` to `next` respects the state machine.
    pub fn can_transition_to(self, next: KsefStatus) -> bool {
        match (self, next) {
            (_, Self::Error) => true,
            (Self::Error, Self::Sent) => true,
            (Self::Error, _) => false,
            (current, next) => next.rank() > current.rank(),
        }
    }

    /// Sent to KSeF and waiting for the asynchronous outcome.
    pub fn is_awaiting_outcome(self) -> bool {
        matches!(self, Self::Sent | Self::Processing)
    }
}

/// Submission bookkeeping attached to an invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionState {
    pub reference_number: Option<String>,
    pub status: KsefStatus,
    pub session_id: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub processing_description: Option<String>,
}

/// A single invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl InvoiceItem {
    /// Line with `total_price = quantity * unit_price`.
    pub fn priced(
        name: impl Into<String>,
        quantity: Decimal,
        unit: impl Into<String>,
        unit_price: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: unit.into(),
            unit_price,
            total_price: quantity * unit_price,
        }
    }
}

/// Persisted invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub tenant_id: String,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub sale_date: NaiveDate,
    pub payment_date: NaiveDate,
    pub payment_method: String,
    pub counterparty_id: Option<i64>,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub is_correction: bool,
    pub correction_reason: Option<String>,
    pub corrected_invoice_number: Option<String>,
    pub items: Vec<InvoiceItem>,
    pub submission: SubmissionState,
}

/// Invoice fields before the repository assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub tenant_id: String,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub sale_date: NaiveDate,
    pub payment_date: NaiveDate,
    pub payment_method: String,
    pub counterparty_id: Option<i64>,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub is_correction: bool,
    pub correction_reason: Option<String>,
    pub corrected_invoice_number: Option<String>,
    pub items: Vec<InvoiceItem>,
}

impl NewInvoice {
    /// Draft with the default payment terms (transfer, issue date + 14 days).
    pub fn draft(
        tenant_id: impl Into<String>,
        invoice_number: impl Into<String>,
        issue_date: NaiveDate,
        sale_date: NaiveDate,
        total_amount: Decimal,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            invoice_number: invoice_number.into(),
            issue_date,
            sale_date,
            payment_date: issue_date + Duration::days(DEFAULT_PAYMENT_TERM_DAYS),
            payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
            counterparty_id: None,
            total_amount,
            notes: None,
            is_correction: false,
            correction_reason: None,
            corrected_invoice_number: None,
            items: Vec::new(),
        }
    }

    /// Attach lines and recompute the total from them.
    pub fn attach_items(&mut self, items: Vec<InvoiceItem>) {
        self.total_amount = items.iter().map(|item| item.total_price).sum();
        self.items = items;
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test]
    fn forward_transitions_only() {
        assert!(KsefStatus::Unsent.can_transition_to(KsefStatus::Sent));
        assert!(KsefStatus::Sent.can_transition_to(KsefStatus::Processed));
        assert!(!KsefStatus::Processed.can_transition_to(KsefStatus::Sent));
        assert!(!KsefStatus::Sent.can_transition_to(KsefStatus::Unsent));
    }

    #[test]
    fn error_is_reachable_from_everywhere_and_may_be_resent() {
        for status in [KsefStatus::Unsent, KsefStatus::Sent, KsefStatus::Processed] {
            assert!(status.can_transition_to(KsefStatus::Error));
        }
        assert!(KsefStatus::Error.can_transition_to(KsefStatus::Sent));
        assert!(!KsefStatus::Error.can_transition_to(KsefStatus::Processed));
    }

    #[test]
    fn draft_uses_default_payment_terms() {
        let issue = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let draft = NewInvoice::draft("acme", "FV/1/2024", issue, issue, dec("100.00"));
        assert_eq!(draft.payment_date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(draft.payment_method, "transfer");
    }

    #[test]
    fn attach_items_recomputes_total() {
        let issue = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut draft = NewInvoice::draft("acme", "FV/1/2024", issue, issue, dec("999.99"));
        draft.attach_items(vec![
            InvoiceItem::priced("Consulting", dec("2"), "godz.", dec("150.00")),
            InvoiceItem::priced("Travel", dec("1"), "szt.", dec("40.50")),
        ]);
        assert_eq!(draft.total_amount, dec("340.50"));
    }
}
