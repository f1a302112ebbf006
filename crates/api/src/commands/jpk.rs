use std::fs;
use std::path::Path;

use chrono::Utc;
use ksef_domain::{KsefError, Result};
use tracing::info;

use crate::context::AppContext;

pub fn import(ctx: &AppContext, tenant: &str, file: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(file).map_err(|err| {
        KsefError::InvalidInput(format!("cannot read {}: {err}", file.display()))
    })?;

    let report = ctx.importer.parse(&bytes, tenant)?;

    let mut lines: Vec<String> = report
        .created
        .iter()
        .map(|imported| {
            format!(
                "Created #{} {} ({} items)",
                imported.invoice.id, imported.invoice.invoice_number, imported.item_count
            )
        })
        .collect();
    lines.extend(report.warnings.iter().map(|warning| format!("Warning: {warning}")));
    lines.push(format!(
        "Imported {} invoice(s) with {} warning(s).",
        report.created.len(),
        report.warnings.len()
    ));
    Ok(lines)
}

pub fn export(
    ctx: &AppContext,
    tenant: &str,
    output: &Path,
    tax_office: Option<&str>,
    invoice_ids: &[i64],
) -> Result<Vec<String>> {
    let xml = ctx.jpk_exporter(tax_office).export(tenant, invoice_ids, Utc::now())?;

    fs::write(output, xml.as_bytes()).map_err(|err| {
        KsefError::InvalidInput(format!("cannot write {}: {err}", output.display()))
    })?;
    info!(path = %output.display(), bytes = xml.len(), "JPK_FA file written");

    Ok(vec![format!("Exported {} invoice(s) to {}", invoice_ids.len(), output.display())])
}
