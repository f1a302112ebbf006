//! Records produced by the JPK_FA reader before persistence

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::invoice::InvoiceItem;

/// One `Faktura` node as read from a JPK_FA document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedInvoiceRecord {
    /// Generated when the document carries none.
    pub invoice_number: String,
    pub number_was_generated: bool,
    pub counterparty_tax_id: Option<String>,
    pub counterparty_name: Option<String>,
    pub counterparty_address: Option<String>,
    pub issue_date: NaiveDate,
    pub sale_date: NaiveDate,
    pub total_amount: Decimal,
    pub is_correction: bool,
    pub correction_reason: Option<String>,
    pub corrected_invoice_number: Option<String>,
    pub items: Vec<InvoiceItem>,
}

impl ImportedInvoiceRecord {
    /// Whether the buyer can be resolved at all.
    pub fn has_counterparty(&self) -> bool {
        self.counterparty_tax_id.is_some() || self.counterparty_name.is_some()
    }
}
