//! Integration tests for `JpkExporter`

mod support;

use chrono::{TimeZone, Utc};
use ksef_domain::constants::JPK_FA_4_NAMESPACE;
use ksef_domain::{CompanyCredential, KsefError, NewInvoice};
use support::{date, dec, Harness, TENANT};

fn generated_at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap()
}

fn child_text<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children().find(|child| child.has_tag_name(name)).and_then(|child| child.text())
}

#[test]
fn exports_header_seller_invoices_and_control_sums() {
    let harness = Harness::new();
    let first = harness.seed_invoice("FV/1/05/2024");
    let mut bare = NewInvoice::draft(
        TENANT,
        "FV/2/05/2024",
        date("2024-05-20"),
        date("2024-05-19"),
        dec("99.90"),
    );
    bare.counterparty_id = first.counterparty_id;
    let second = harness.invoices.seed(&bare);

    let xml = harness.exporter().export(TENANT, &[first.id, second.id], generated_at()).unwrap();

    let doc = roxmltree::Document::parse(&xml).unwrap();
    let root = doc.root_element();
    assert_eq!(root.tag_name().name(), "JPK");
    assert_eq!(root.tag_name().namespace(), Some(JPK_FA_4_NAMESPACE));

    let header = root.children().find(|node| node.has_tag_name("Naglowek")).unwrap();
    assert_eq!(child_text(header, "DataOd"), Some("2024-05-02"));
    assert_eq!(child_text(header, "DataDo"), Some("2024-05-20"));
    assert_eq!(child_text(header, "DataWytworzeniaJPK"), Some("2024-06-01T12:30:00Z"));
    assert_eq!(child_text(header, "KodUrzedu"), Some("0000"));

    let invoices: Vec<_> = root.children().filter(|node| node.has_tag_name("Faktura")).collect();
    assert_eq!(invoices.len(), 2);
    assert_eq!(child_text(invoices[0], "P_4B"), Some("5260001246"));
    assert_eq!(child_text(invoices[0], "P_5B"), Some("1112223344"));
    assert_eq!(child_text(invoices[0], "RodzajFaktury"), Some("VAT"));

    let invoice_ctrl = root.children().find(|node| node.has_tag_name("FakturaCtrl")).unwrap();
    assert_eq!(child_text(invoice_ctrl, "LiczbaFaktur"), Some("2"));
    assert_eq!(child_text(invoice_ctrl, "WartoscFaktur"), Some("399.90"));

    let lines: Vec<_> = root.children().filter(|node| node.has_tag_name("FakturaWiersz")).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(child_text(lines[1], "P_7"), Some("Invoice FV/2/05/2024 (consolidated)"));
    let line_ctrl = root.children().find(|node| node.has_tag_name("FakturaWierszCtrl")).unwrap();
    assert_eq!(child_text(line_ctrl, "LiczbaWierszyFaktur"), Some("2"));
    assert_eq!(child_text(line_ctrl, "WartoscWierszyFaktur"), Some("399.90"));
}

#[test]
fn free_text_is_escaped() {
    let harness = Harness::new();
    let invoice = harness.seed_invoice("FV/3/05/2024");

    let xml = harness.exporter().export(TENANT, &[invoice.id], generated_at()).unwrap();

    assert!(xml.contains("<P_3A>Hurtownia &quot;Pod Lipą&quot; &amp; Syn</P_3A>"));
    assert!(xml.contains("<P_7>Konsultacje &lt;IT&gt;</P_7>"));
}

#[test]
fn tax_office_code_can_be_overridden() {
    let harness = Harness::new();
    let invoice = harness.seed_invoice("FV/4/05/2024");

    let xml = harness
        .exporter()
        .with_tax_office_code("1471")
        .export(TENANT, &[invoice.id], generated_at())
        .unwrap();

    assert!(xml.contains("<KodUrzedu>1471</KodUrzedu>"));
}

#[test]
fn corrections_carry_reason_and_original_number() {
    let harness = Harness::new();
    let original = harness.seed_invoice("FV/5/05/2024");
    let mut correction = NewInvoice::draft(
        TENANT,
        "KOR/1/05/2024",
        date("2024-05-10"),
        date("2024-05-10"),
        dec("-50.00"),
    );
    correction.counterparty_id = original.counterparty_id;
    correction.is_correction = true;
    correction.correction_reason = Some("Rabat posprzedażowy".into());
    correction.corrected_invoice_number = Some(original.invoice_number.clone());
    let correction = harness.invoices.seed(&correction);

    let xml = harness.exporter().export(TENANT, &[correction.id], generated_at()).unwrap();

    assert!(xml.contains("<RodzajFaktury>KOREKTA</RodzajFaktury>"));
    assert!(xml.contains("<PrzyczynaKorekty>Rabat posprzedażowy</PrzyczynaKorekty>"));
    assert!(xml.contains("<NrFaKorygowanej>FV/5/05/2024</NrFaKorygowanej>"));
}

#[test]
fn missing_company_profile_is_a_configuration_error() {
    let harness = Harness::with_company(CompanyCredential::empty("someone-else"));
    let invoice = harness.seed_invoice("FV/6/05/2024");

    let err = harness.exporter().export(TENANT, &[invoice.id], generated_at()).unwrap_err();

    assert!(matches!(err, KsefError::Config(msg) if msg.contains("company set")));
}

#[test]
fn invoices_of_other_tenants_are_not_exported() {
    let harness = Harness::new();
    let foreign = harness.invoices.seed(&NewInvoice::draft(
        "other",
        "FV/1/OTHER",
        date("2024-05-02"),
        date("2024-05-02"),
        dec("10"),
    ));

    let err = harness.exporter().export(TENANT, &[foreign.id], generated_at()).unwrap_err();

    assert!(matches!(err, KsefError::InvalidInput(msg) if msg.contains("acme")));
}

#[test]
fn exported_document_imports_back() {
    let source = Harness::new();
    let invoice = source.seed_invoice("FV/7/05/2024");
    let xml = source.exporter().export(TENANT, &[invoice.id], generated_at()).unwrap();

    let target = Harness::new();
    let report = target.importer().parse(xml.as_bytes(), TENANT).unwrap();

    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    let imported = &report.created[0].invoice;
    assert_eq!(imported.invoice_number, "FV/7/05/2024");
    assert_eq!(imported.total_amount, dec("300.00"));
    assert_eq!(imported.items.len(), 1);
    assert_eq!(imported.items[0].name, "Konsultacje <IT>");
    assert_eq!(target.counterparties.all()[0].tax_id.as_deref(), Some("1112223344"));
}
