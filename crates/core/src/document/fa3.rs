//! FA(3) structured invoice document

use chrono::{DateTime, Utc};
use ksef_domain::constants::{DEFAULT_CURRENCY, FA3_NAMESPACE};
use ksef_domain::{normalize_nip, CompanyCredential, Counterparty, Invoice, KsefError, Result};
use rust_decimal::Decimal;

use super::xml::XmlDocument;

/// VAT exemption marker written for every line.
const EXEMPT_RATE: &str = "zw";

/// Builds the FA(3) XML submitted to KSeF.
#[derive(Debug, Clone)]
pub struct InvoiceXmlBuilder {
    system_info: String,
}

impl InvoiceXmlBuilder {
    pub fn new(system_info: impl Into<String>) -> Self {
        Self { system_info: system_info.into() }
    }

    /// Render `invoice` issued by `seller` to `buyer`.
    ///
    /// All free text is XML-escaped. Amounts are written as stored.
    ///
    /// # Errors
    /// `InvalidInput` when the buyer is missing, `Config` when the seller NIP
    /// is missing or malformed.
    pub fn build(
        &self,
        invoice: &Invoice,
        seller: &CompanyCredential,
        buyer: Option<&Counterparty>,
        generated_at: DateTime<Utc>,
    ) -> Result<String> {
        let buyer = buyer.ok_or_else(|| {
            KsefError::InvalidInput(format!(
                "invoice {} has no counterparty",
                invoice.invoice_number
            ))
        })?;
        let seller_nip = normalize_nip(seller.tax_id.as_deref().unwrap_or_default())?;

        let mut doc = XmlDocument::new()?;
        doc.open_with("Faktura", &[("xmlns", FA3_NAMESPACE)])?;

        self.write_header(&mut doc, generated_at)?;
        write_party(
            &mut doc,
            "Podmiot1",
            Some(seller_nip.as_str()),
            &seller.company_name,
            (seller.street.as_str(), seller.city.as_str(), seller.zip_code.as_str()),
        )?;
        let buyer_nip = buyer.tax_id.as_deref().map(strip_separators);
        write_party(
            &mut doc,
            "Podmiot2",
            buyer_nip.as_deref(),
            &buyer.name,
            (buyer.street.as_str(), buyer.city.as_str(), buyer.zip_code.as_str()),
        )?;
        write_body(&mut doc, invoice)?;

        doc.close("Faktura")?;
        doc.finish()
    }

    fn write_header(&self, doc: &mut XmlDocument, generated_at: DateTime<Utc>) -> Result<()> {
        doc.open("Naglowek")?;
        doc.text_with(
            "KodFormularza",
            &[("kodSystemowy", "FA (3)"), ("wersjaSchemy", "1-0")],
            "FA",
        )?;
        doc.value("WariantFormularza", 3)?;
        doc.value("DataWytworzeniaFa", generated_at.format("%Y-%m-%dT%H:%M:%SZ"))?;
        doc.text("SystemInfo", &self.system_info)?;
        doc.close("Naglowek")
    }
}

fn write_party(
    doc: &mut XmlDocument,
    element: &str,
    nip: Option<&str>,
    name: &str,
    (street, city, zip_code): (&str, &str, &str),
) -> Result<()> {
    doc.open(element)?;

    doc.open("DaneIdentyfikacyjne")?;
    match nip {
        Some(nip) => doc.text("NIP", nip)?,
        None => doc.value("BrakID", 1)?,
    }
    doc.text("Nazwa", name)?;
    doc.close("DaneIdentyfikacyjne")?;

    doc.open("Adres")?;
    doc.text("KodKraju", "PL")?;
    doc.text("Ulica", street)?;
    doc.text("Miejscowosc", city)?;
    doc.text("KodPocztowy", zip_code)?;
    doc.close("Adres")?;

    doc.close(element)
}

fn write_body(doc: &mut XmlDocument, invoice: &Invoice) -> Result<()> {
    doc.open("Fa")?;
    doc.text("KodWaluty", DEFAULT_CURRENCY)?;
    doc.value("P_1", invoice.issue_date)?;
    doc.text("P_2", &invoice.invoice_number)?;
    doc.value("P_6", invoice.sale_date)?;

    for (index, item) in invoice.items.iter().enumerate() {
        doc.open("FaWiersz")?;
        doc.value("NrWierszaFa", index + 1)?;
        doc.text("P_7", &item.name)?;
        doc.text("P_8A", &item.unit)?;
        doc.value("P_8B", item.quantity)?;
        doc.value("P_9A", item.unit_price)?;
        doc.value("P_11", item.total_price)?;
        doc.text("P_12", EXEMPT_RATE)?;
        doc.close("FaWiersz")?;
    }

    doc.value("P_13_7", invoice.total_amount)?;
    doc.value("P_14_7", Decimal::new(0, 2))?;
    doc.value("P_15", invoice.total_amount)?;

    doc.open("Adnotacje")?;
    for (flag, value) in
        [("P_16", 2), ("P_17", 1), ("P_18", 1), ("P_18A", 2), ("P_22", 2), ("P_23", 2)]
    {
        doc.value(flag, value)?;
    }
    doc.close("Adnotacje")?;

    if invoice.is_correction {
        doc.text("RodzajFaktury", "KOR")?;
        if let Some(reason) = invoice.correction_reason.as_deref() {
            doc.text("PrzyczynaKorekty", reason)?;
        }
        if let Some(corrected) = invoice.corrected_invoice_number.as_deref() {
            doc.open("DaneFaKorygowanej")?;
            doc.text("NrFaKorygowanej", corrected)?;
            doc.close("DaneFaKorygowanej")?;
        }
    } else {
        doc.text("RodzajFaktury", "VAT")?;
    }

    doc.close("Fa")
}

fn strip_separators(raw: &str) -> String {
    raw.chars().filter(|c| *c != '-' && !c.is_whitespace()).collect()
}
