//! Field extraction from parsed JPK_FA documents
//!
//! Element lookups match on local names so the same code serves every schema
//! edition once the document namespace is known.

use std::str::FromStr;

use chrono::NaiveDate;
use ksef_domain::constants::{
    DEFAULT_ITEM_UNIT, JPK_FA_2_NAMESPACE, JPK_FA_3_NAMESPACE, JPK_FA_4_NAMESPACE,
};
use ksef_domain::{ImportedInvoiceRecord, InvoiceItem, KsefError, Result};
use roxmltree::{Document, Node};
use rust_decimal::Decimal;

/// Namespaces tried in order; `None` is the unqualified fallback.
pub(crate) const NAMESPACE_CANDIDATES: [Option<&str>; 4] =
    [Some(JPK_FA_4_NAMESPACE), Some(JPK_FA_3_NAMESPACE), Some(JPK_FA_2_NAMESPACE), None];

const INVOICE_NUMBER: &[&str] = &["P_2A", "2A", "NrFaktury"];
const BUYER_NIP: &[&str] = &["P_5B", "5B", "NIPNabywcy"];
const BUYER_NAME: &[&str] = &["P_3A", "3A", "NazwaNabywcy"];
const BUYER_ADDRESS: &[&str] = &["P_3B", "3B", "AdresNabywcy"];
const ISSUE_DATE: &[&str] = &["P_1", "1", "DataWystawienia"];
const SALE_DATE: &[&str] = &["P_6", "6", "DataSprzedazy"];
const GROSS_TOTAL: &[&str] = &["P_15", "15", "KwotaNaleznosci"];
const INVOICE_KIND: &[&str] = &["RodzajFaktury"];
const CORRECTION_REASON: &[&str] = &["PrzyczynaKorekty"];
const CORRECTED_NUMBER: &[&str] = &["NrFaKorygowanej"];

const ITEM_INVOICE_NUMBER: &[&str] = &["P_2B", "2B", "NrFaktury"];
const ITEM_NAME: &[&str] = &["P_7", "7", "Nazwa"];
const ITEM_UNIT: &[&str] = &["P_8A", "8A", "JednostkaMiary"];
const ITEM_QUANTITY: &[&str] = &["P_8B", "8B", "Ilosc"];
const ITEM_UNIT_PRICE: &[&str] = &["P_9A", "9A", "P_9B"];
const ITEM_TOTAL: &[&str] = &["P_11", "11", "P_11A"];

const CORRECTION_KIND: &str = "KOREKTA";

/// `Faktura` elements of the first namespace that has any, with that
/// namespace.
///
/// # Errors
/// `ImportValidation` when no candidate namespace yields a `Faktura`.
pub(crate) fn invoice_nodes<'a, 'input>(
    doc: &'a Document<'input>,
) -> Result<(Option<&'static str>, Vec<Node<'a, 'input>>)> {
    for namespace in NAMESPACE_CANDIDATES {
        let nodes = elements_named(doc, namespace, "Faktura");
        if !nodes.is_empty() {
            return Ok((namespace, nodes));
        }
    }
    Err(KsefError::ImportValidation(
        "no Faktura elements found under any supported JPK_FA namespace".into(),
    ))
}

/// All elements with `local_name` in `namespace` (`None` = unqualified).
pub(crate) fn elements_named<'a, 'input>(
    doc: &'a Document<'input>,
    namespace: Option<&str>,
    local_name: &str,
) -> Vec<Node<'a, 'input>> {
    doc.descendants()
        .filter(|node| {
            node.is_element()
                && node.tag_name().name() == local_name
                && node.tag_name().namespace() == namespace
        })
        .collect()
}

/// First non-empty child text among `candidates`, in candidate order.
pub(crate) fn field<'a>(node: Node<'a, '_>, candidates: &[&str]) -> Option<&'a str> {
    candidates.iter().find_map(|name| {
        node.children()
            .filter(|child| child.is_element() && child.tag_name().name() == *name)
            .filter_map(|child| child.text())
            .map(str::trim)
            .find(|text| !text.is_empty())
    })
}

/// Parse an amount, accepting `,` as the decimal separator.
pub(crate) fn parse_amount(raw: &str) -> Result<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    Decimal::from_str(&cleaned)
        .map_err(|_| KsefError::InvalidInput(format!("invalid amount '{}'", raw.trim())))
}

fn parse_date(raw: &str, label: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| KsefError::InvalidInput(format!("invalid {label} '{raw}'")))
}

/// Invoice number an item line belongs to.
pub(crate) fn item_invoice_number<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    field(node, ITEM_INVOICE_NUMBER)
}

/// Read one `FakturaWiersz`.
///
/// Quantity defaults to 1 and unit to `szt.`. A missing unit price or total
/// is derived from the other one.
pub(crate) fn read_item(node: Node<'_, '_>) -> Result<InvoiceItem> {
    let name = field(node, ITEM_NAME)
        .ok_or_else(|| KsefError::InvalidInput("line has no name (P_7)".into()))?;
    let unit = field(node, ITEM_UNIT).unwrap_or(DEFAULT_ITEM_UNIT);
    let quantity =
        field(node, ITEM_QUANTITY).map(parse_amount).transpose()?.unwrap_or(Decimal::ONE);
    let unit_price = field(node, ITEM_UNIT_PRICE).map(parse_amount).transpose()?;
    let total = field(node, ITEM_TOTAL).map(parse_amount).transpose()?;

    let (unit_price, total_price) = match (unit_price, total) {
        (Some(price), Some(total)) => (price, total),
        (Some(price), None) => (price, price * quantity),
        (None, Some(total)) if quantity.is_zero() => (total, total),
        (None, Some(total)) => (total / quantity, total),
        (None, None) => {
            return Err(KsefError::InvalidInput(format!(
                "line '{name}' has neither unit price nor total"
            )))
        }
    };

    Ok(InvoiceItem {
        name: name.to_string(),
        quantity,
        unit: unit.to_string(),
        unit_price,
        total_price,
    })
}

/// Read one `Faktura` node. `synthesize_number` is called only when the node
/// carries no invoice number.
pub(crate) fn read_invoice(
    node: Node<'_, '_>,
    synthesize_number: impl FnOnce() -> String,
) -> Result<ImportedInvoiceRecord> {
    let (invoice_number, number_was_generated) = match field(node, INVOICE_NUMBER) {
        Some(number) => (number.to_string(), false),
        None => (synthesize_number(), true),
    };

    let issue_date = field(node, ISSUE_DATE)
        .ok_or_else(|| KsefError::InvalidInput("missing issue date (P_1)".into()))
        .and_then(|raw| parse_date(raw, "issue date"))?;
    let sale_date = match field(node, SALE_DATE) {
        Some(raw) => parse_date(raw, "sale date")?,
        None => issue_date,
    };
    let total_amount = field(node, GROSS_TOTAL)
        .ok_or_else(|| KsefError::InvalidInput("missing gross total (P_15)".into()))
        .and_then(parse_amount)?;

    let is_correction =
        field(node, INVOICE_KIND).is_some_and(|kind| kind.eq_ignore_ascii_case(CORRECTION_KIND));

    Ok(ImportedInvoiceRecord {
        invoice_number,
        number_was_generated,
        counterparty_tax_id: field(node, BUYER_NIP).map(str::to_string),
        counterparty_name: field(node, BUYER_NAME).map(str::to_string),
        counterparty_address: field(node, BUYER_ADDRESS).map(str::to_string),
        issue_date,
        sale_date,
        total_amount,
        is_correction,
        correction_reason: field(node, CORRECTION_REASON).map(str::to_string),
        corrected_invoice_number: field(node, CORRECTED_NUMBER).map(str::to_string),
        items: Vec::new(),
    })
}
