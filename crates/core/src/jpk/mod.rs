//! JPK_FA file import and export

mod decode;
mod exporter;
mod importer;
mod reader;

use ksef_domain::constants::DEFAULT_ITEM_UNIT;
use ksef_domain::InvoiceItem;
use rust_decimal::Decimal;

pub use decode::decode_document;
pub use exporter::{JpkExporter, DEFAULT_TAX_OFFICE_CODE};
pub use importer::{ImportReport, ImportedInvoice, JpkImporter};

/// Single line standing in for an invoice that has no lines of its own.
pub(crate) fn consolidated_item(invoice_number: &str, total: Decimal) -> InvoiceItem {
    InvoiceItem {
        name: format!("Invoice {invoice_number} (consolidated)"),
        quantity: Decimal::ONE,
        unit: DEFAULT_ITEM_UNIT.to_string(),
        unit_price: total,
        total_price: total,
    }
}
