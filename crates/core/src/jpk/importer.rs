//! JPK_FA import
//!
//! A document-level problem aborts the import before anything is written.
//! Problems with a single `Faktura` node become warnings and the remaining
//! nodes are still imported.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ksef_domain::{
    Counterparty, ImportedInvoiceRecord, Invoice, InvoiceItem, KsefError, NewCounterparty,
    NewInvoice, Result,
};
use roxmltree::Document;
use serde::Serialize;
use tracing::{info, warn};

use super::consolidated_item;
use super::decode::decode_document;
use super::reader::{elements_named, invoice_nodes, item_invoice_number, read_invoice, read_item};
use crate::invoices::ports::{CounterpartyStore, InvoiceRepository};

/// Invoice created by an import with the number of lines attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedInvoice {
    pub invoice: Invoice,
    pub item_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub created: Vec<ImportedInvoice>,
    pub warnings: Vec<String>,
}

enum NodeOutcome {
    Created(ImportedInvoice),
    Skipped(String),
}

/// Creates invoices and counterparties from JPK_FA files.
pub struct JpkImporter {
    invoices: Arc<dyn InvoiceRepository>,
    counterparties: Arc<dyn CounterpartyStore>,
}

impl JpkImporter {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        counterparties: Arc<dyn CounterpartyStore>,
    ) -> Self {
        Self { invoices, counterparties }
    }

    /// Import every `Faktura` of `xml_bytes` into `tenant_id`.
    ///
    /// # Errors
    /// `ImportValidation` when the file cannot be decoded, is not XML, or has
    /// no `Faktura` element under a supported namespace. Nothing is created in
    /// that case.
    pub fn parse(&self, xml_bytes: &[u8], tenant_id: &str) -> Result<ImportReport> {
        let text = decode_document(xml_bytes)?;
        let doc = Document::parse(&text)
            .map_err(|err| KsefError::ImportValidation(format!("invalid XML: {err}")))?;
        let (namespace, nodes) = invoice_nodes(&doc)?;
        info!(
            tenant_id,
            namespace = namespace.unwrap_or("none"),
            invoices = nodes.len(),
            "importing JPK_FA document"
        );

        let mut report = ImportReport::default();
        let mut items = collect_items(&doc, namespace, &mut report.warnings);

        let imported_at = Utc::now();
        let mut generated = 0_usize;

        for (index, node) in nodes.into_iter().enumerate() {
            let position = index + 1;
            // Earlier imports within the same second may already hold a number.
            let record = read_invoice(node, || loop {
                generated += 1;
                let candidate = synthesized_number(imported_at, generated);
                match self.invoices.invoice_number_exists(tenant_id, &candidate) {
                    Ok(true) => continue,
                    _ => break candidate,
                }
            });
            let outcome = record.and_then(|mut record| {
                record.items = items.remove(&record.invoice_number).unwrap_or_default();
                self.import_record(record, tenant_id, &mut report.warnings)
            });

            match outcome {
                Ok(NodeOutcome::Created(created)) => report.created.push(created),
                Ok(NodeOutcome::Skipped(reason)) => report.warnings.push(reason),
                Err(err) => {
                    warn!(position, error = %err, "skipping malformed Faktura node");
                    report.warnings.push(format!("Faktura #{position}: {err}"));
                }
            }
        }

        info!(
            tenant_id,
            created = report.created.len(),
            warnings = report.warnings.len(),
            "JPK_FA import finished"
        );
        Ok(report)
    }

    fn import_record(
        &self,
        record: ImportedInvoiceRecord,
        tenant_id: &str,
        warnings: &mut Vec<String>,
    ) -> Result<NodeOutcome> {
        let number = record.invoice_number.clone();

        if record.number_was_generated {
            warnings.push(format!("invoice without number imported as {number}"));
        }
        if self.invoices.invoice_number_exists(tenant_id, &number)? {
            return Ok(NodeOutcome::Skipped(format!(
                "invoice {number} already exists; skipped"
            )));
        }
        let Some(counterparty) = self.resolve_counterparty(&record, tenant_id)? else {
            return Ok(NodeOutcome::Skipped(format!(
                "invoice {number} has no buyer tax id or name; skipped"
            )));
        };

        let mut correction_reason = record.correction_reason.clone();
        if record.is_correction {
            if let Some(original) = record.corrected_invoice_number.as_deref() {
                if !self.invoices.invoice_number_exists(tenant_id, original)? {
                    let note = format!("original invoice {original} not found");
                    correction_reason = Some(match correction_reason {
                        Some(reason) => format!("{reason} ({note})"),
                        None => note,
                    });
                    warnings.push(format!(
                        "correction {number} refers to unknown invoice {original}"
                    ));
                }
            }
        }

        let mut items = record.items;
        if items.is_empty() && !record.total_amount.is_zero() {
            items.push(consolidated_item(&number, record.total_amount));
        }
        let item_count = items.len();

        let mut invoice = NewInvoice::draft(
            tenant_id,
            number,
            record.issue_date,
            record.sale_date,
            record.total_amount,
        );
        invoice.counterparty_id = Some(counterparty.id);
        invoice.is_correction = record.is_correction;
        invoice.correction_reason = correction_reason;
        invoice.corrected_invoice_number = record.corrected_invoice_number;
        invoice.attach_items(items);
        // Line totals may not add up to the declared gross amount.
        invoice.total_amount = record.total_amount;

        let created = self.invoices.create_invoice(&invoice)?;
        Ok(NodeOutcome::Created(ImportedInvoice { invoice: created, item_count }))
    }

    /// Find or create the buyer: by tax id when present, otherwise by name
    /// among counterparties without a tax id.
    fn resolve_counterparty(
        &self,
        record: &ImportedInvoiceRecord,
        tenant_id: &str,
    ) -> Result<Option<Counterparty>> {
        let address = record.counterparty_address.clone().unwrap_or_default();

        if let Some(tax_id) = record.counterparty_tax_id.as_deref() {
            let tax_id: String =
                tax_id.chars().filter(|c| *c != '-' && !c.is_whitespace()).collect();
            if let Some(existing) = self.counterparties.find_by_tax_id(tenant_id, &tax_id)? {
                return Ok(Some(existing));
            }
            let name = record.counterparty_name.clone().unwrap_or_else(|| tax_id.clone());
            let created = self.counterparties.create_counterparty(&NewCounterparty {
                tenant_id: tenant_id.to_string(),
                name,
                tax_id: Some(tax_id),
                street: address,
                ..NewCounterparty::default()
            })?;
            return Ok(Some(created));
        }

        let Some(name) = record.counterparty_name.as_deref() else {
            return Ok(None);
        };
        if let Some(existing) = self.counterparties.find_by_name_without_tax_id(tenant_id, name)? {
            return Ok(Some(existing));
        }
        self.counterparties
            .create_counterparty(&NewCounterparty {
                tenant_id: tenant_id.to_string(),
                name: name.to_string(),
                tax_id: None,
                street: address,
                ..NewCounterparty::default()
            })
            .map(Some)
    }
}

/// First pass over `FakturaWiersz`: lines keyed by invoice number. Items are
/// siblings of the invoices, not children.
fn collect_items(
    doc: &Document<'_>,
    namespace: Option<&str>,
    warnings: &mut Vec<String>,
) -> HashMap<String, Vec<InvoiceItem>> {
    let mut items: HashMap<String, Vec<InvoiceItem>> = HashMap::new();

    for (index, node) in elements_named(doc, namespace, "FakturaWiersz").into_iter().enumerate() {
        let position = index + 1;
        let Some(number) = item_invoice_number(node) else {
            warnings.push(format!("FakturaWiersz #{position}: no invoice number; skipped"));
            continue;
        };
        match read_item(node) {
            Ok(item) => items.entry(number.to_string()).or_default().push(item),
            Err(err) => warnings.push(format!("FakturaWiersz #{position} ({number}): {err}")),
        }
    }

    items
}

fn synthesized_number(imported_at: DateTime<Utc>, sequence: usize) -> String {
    format!("IMP/{}/{sequence}", imported_at.format("%Y%m%d%H%M%S"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn synthesized_numbers_embed_timestamp_and_counter() {
        let at = Utc.with_ymd_and_hms(2024, 2, 29, 8, 5, 9).unwrap();
        assert_eq!(synthesized_number(at, 3), "IMP/20240229080509/3");
    }
}
