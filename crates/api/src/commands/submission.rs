use crate::context::AppContext;

/// Invoices are sent one at a time; a failure does not stop the batch.
pub fn submit(ctx: &AppContext, invoice_ids: &[i64]) -> Vec<String> {
    invoice_ids
        .iter()
        .map(|&id| {
            let outcome = ctx.submission.submit(id);
            let verdict = if outcome.success { "OK" } else { "FAILED" };
            format!("#{} {verdict}: {}", outcome.invoice_id, outcome.message)
        })
        .collect()
}

pub fn check_status(ctx: &AppContext, invoice_ids: &[i64]) -> Vec<String> {
    ctx.status
        .check_many(invoice_ids)
        .into_iter()
        .map(|outcome| match outcome.invoice_number {
            Some(number) => {
                format!("[{}] #{} {number}: {}", outcome.level, outcome.invoice_id, outcome.message)
            }
            None => format!("[{}] #{}: {}", outcome.level, outcome.invoice_id, outcome.message),
        })
        .collect()
}
