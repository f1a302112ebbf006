//! JPK_FA(4) export

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ksef_domain::constants::{DEFAULT_CURRENCY, JPK_FA_4_NAMESPACE};
use ksef_domain::{
    normalize_nip, CompanyCredential, Counterparty, Invoice, InvoiceItem, KsefError, Result,
};
use rust_decimal::Decimal;
use tracing::info;

use super::consolidated_item;
use crate::credentials::ports::CredentialStore;
use crate::document::xml::XmlDocument;
use crate::invoices::ports::{CounterpartyStore, InvoiceRepository};

/// Tax office code used until a tenant-specific one is configured.
pub const DEFAULT_TAX_OFFICE_CODE: &str = "0000";

/// Renders selected invoices of a tenant as one JPK_FA(4) document.
pub struct JpkExporter {
    invoices: Arc<dyn InvoiceRepository>,
    counterparties: Arc<dyn CounterpartyStore>,
    credentials: Arc<dyn CredentialStore>,
    tax_office_code: String,
}

impl JpkExporter {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        counterparties: Arc<dyn CounterpartyStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            invoices,
            counterparties,
            credentials,
            tax_office_code: DEFAULT_TAX_OFFICE_CODE.to_string(),
        }
    }

    pub fn with_tax_office_code(mut self, code: impl Into<String>) -> Self {
        self.tax_office_code = code.into();
        self
    }

    /// Export `invoice_ids` owned by `tenant_id`. Ids of other tenants are
    /// ignored.
    ///
    /// # Errors
    /// `Config` when the tenant has no company profile or NIP,
    /// `InvalidInput` when none of the ids resolve to the tenant's invoices.
    pub fn export(
        &self,
        tenant_id: &str,
        invoice_ids: &[i64],
        generated_at: DateTime<Utc>,
    ) -> Result<String> {
        let company = self.credentials.load(tenant_id)?.ok_or_else(|| {
            KsefError::Config(format!(
                "company profile is not configured for tenant '{tenant_id}'; \
                 run `company set` first"
            ))
        })?;
        let seller_nip = normalize_nip(company.tax_id.as_deref().unwrap_or_default())?;

        let invoices = self.invoices.invoices_by_ids(tenant_id, invoice_ids)?;
        let (Some(date_from), Some(date_to)) = (
            invoices.iter().map(|invoice| invoice.issue_date).min(),
            invoices.iter().map(|invoice| invoice.issue_date).max(),
        ) else {
            return Err(KsefError::InvalidInput(format!(
                "none of the selected invoices belong to tenant '{tenant_id}'"
            )));
        };

        let mut buyers: HashMap<i64, Counterparty> = HashMap::new();
        for id in invoices.iter().filter_map(|invoice| invoice.counterparty_id) {
            if buyers.contains_key(&id) {
                continue;
            }
            if let Some(counterparty) = self.counterparties.get_counterparty(id)? {
                buyers.insert(id, counterparty);
            }
        }

        let mut doc = XmlDocument::new()?;
        doc.open_with("JPK", &[("xmlns", JPK_FA_4_NAMESPACE)])?;

        doc.open("Naglowek")?;
        doc.text_with(
            "KodFormularza",
            &[("kodSystemowy", "JPK_FA (4)"), ("wersjaSchemy", "1-0")],
            "JPK_FA",
        )?;
        doc.value("WariantFormularza", 4)?;
        doc.value("CelZlozenia", 1)?;
        doc.value("DataWytworzeniaJPK", generated_at.format("%Y-%m-%dT%H:%M:%SZ"))?;
        doc.value("DataOd", date_from)?;
        doc.value("DataDo", date_to)?;
        doc.text("KodUrzedu", &self.tax_office_code)?;
        doc.close("Naglowek")?;

        write_seller(&mut doc, &company, &seller_nip)?;

        let mut invoice_sum = Decimal::ZERO;
        for invoice in &invoices {
            let buyer = invoice.counterparty_id.and_then(|id| buyers.get(&id));
            write_invoice(&mut doc, invoice, &company, &seller_nip, buyer)?;
            invoice_sum += invoice.total_amount;
        }
        doc.open("FakturaCtrl")?;
        doc.value("LiczbaFaktur", invoices.len())?;
        doc.value("WartoscFaktur", invoice_sum)?;
        doc.close("FakturaCtrl")?;

        let mut line_count = 0_usize;
        let mut line_sum = Decimal::ZERO;
        for invoice in &invoices {
            let consolidated;
            let lines: &[InvoiceItem] = if invoice.items.is_empty() {
                consolidated = [consolidated_item(&invoice.invoice_number, invoice.total_amount)];
                &consolidated
            } else {
                &invoice.items
            };
            for line in lines {
                write_line(&mut doc, &invoice.invoice_number, line)?;
                line_count += 1;
                line_sum += line.total_price;
            }
        }
        doc.open("FakturaWierszCtrl")?;
        doc.value("LiczbaWierszyFaktur", line_count)?;
        doc.value("WartoscWierszyFaktur", line_sum)?;
        doc.close("FakturaWierszCtrl")?;

        doc.close("JPK")?;
        let xml = doc.finish()?;

        info!(tenant_id, invoices = invoices.len(), lines = line_count, "exported JPK_FA(4)");
        Ok(xml)
    }
}

fn write_seller(doc: &mut XmlDocument, company: &CompanyCredential, nip: &str) -> Result<()> {
    doc.open("Podmiot1")?;
    doc.open("IdentyfikatorPodmiotu")?;
    doc.text("NIP", nip)?;
    doc.text("PelnaNazwa", &company.company_name)?;
    doc.close("IdentyfikatorPodmiotu")?;
    doc.open("AdresPodmiotu")?;
    doc.text("KodKraju", "PL")?;
    doc.text("Miejscowosc", &company.city)?;
    doc.text("Ulica", &company.street)?;
    doc.text("KodPocztowy", &company.zip_code)?;
    doc.close("AdresPodmiotu")?;
    doc.close("Podmiot1")
}

fn write_invoice(
    doc: &mut XmlDocument,
    invoice: &Invoice,
    company: &CompanyCredential,
    seller_nip: &str,
    buyer: Option<&Counterparty>,
) -> Result<()> {
    doc.open("Faktura")?;
    doc.text("KodWaluty", DEFAULT_CURRENCY)?;
    doc.value("P_1", invoice.issue_date)?;
    doc.text("P_2A", &invoice.invoice_number)?;
    if let Some(buyer) = buyer {
        doc.text("P_3A", &buyer.name)?;
        doc.text("P_3B", &format_address(&buyer.street, &buyer.zip_code, &buyer.city))?;
    }
    doc.text("P_3C", &company.company_name)?;
    doc.text("P_3D", &format_address(&company.street, &company.zip_code, &company.city))?;
    doc.text("P_4B", seller_nip)?;
    if let Some(tax_id) = buyer.and_then(|buyer| buyer.tax_id.as_deref()) {
        doc.text("P_5B", tax_id)?;
    }
    doc.value("P_6", invoice.sale_date)?;
    doc.value("P_15", invoice.total_amount)?;
    if invoice.is_correction {
        doc.text("RodzajFaktury", "KOREKTA")?;
        if let Some(reason) = invoice.correction_reason.as_deref() {
            doc.text("PrzyczynaKorekty", reason)?;
        }
        if let Some(corrected) = invoice.corrected_invoice_number.as_deref() {
            doc.text("NrFaKorygowanej", corrected)?;
        }
    } else {
        doc.text("RodzajFaktury", "VAT")?;
    }
    doc.close("Faktura")
}

fn write_line(doc: &mut XmlDocument, invoice_number: &str, line: &InvoiceItem) -> Result<()> {
    doc.open("FakturaWiersz")?;
    doc.text("P_2B", invoice_number)?;
    doc.text("P_7", &line.name)?;
    doc.text("P_8A", &line.unit)?;
    doc.value("P_8B", line.quantity)?;
    doc.value("P_9A", line.unit_price)?;
    doc.value("P_11", line.total_price)?;
    doc.close("FakturaWiersz")
}

fn format_address(street: &str, zip_code: &str, city: &str) -> String {
    let locality = [zip_code, city]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    [street.trim(), locality.as_str()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_skips_empty_parts() {
        assert_eq!(
            format_address("ul. Polna 3", "00-950", "Warszawa"),
            "ul. Polna 3, 00-950 Warszawa"
        );
        assert_eq!(format_address("", "", "Gdańsk"), "Gdańsk");
        assert_eq!(format_address("ul. Polna 3", "", ""), "ul. Polna 3");
    }
}
