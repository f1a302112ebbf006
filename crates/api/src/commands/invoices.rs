use ksef_domain::{Invoice, Result};

use crate::context::AppContext;

pub fn list(ctx: &AppContext, tenant: &str) -> Result<Vec<String>> {
    let invoices = ctx.invoices.list_invoices(tenant)?;
    if invoices.is_empty() {
        return Ok(vec![format!("No invoices for tenant '{tenant}'.")]);
    }
    Ok(invoices.iter().map(row).collect())
}

fn row(invoice: &Invoice) -> String {
    let reference = invoice.submission.reference_number.as_deref().unwrap_or("-");
    format!(
        "#{} {} {} {} [{}] {}",
        invoice.id,
        invoice.invoice_number,
        invoice.issue_date,
        invoice.total_amount,
        invoice.submission.status,
        reference
    )
}
