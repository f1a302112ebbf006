use ksef_core::TokenReport;
use ksef_domain::{KsefEnvironment, Result};

use crate::context::AppContext;

pub fn set(
    ctx: &AppContext,
    tenant: &str,
    token: &str,
    environment: KsefEnvironment,
) -> Result<Vec<String>> {
    let report = ctx.credentials.set_token(tenant, token, environment)?;
    let mut lines = vec![format!("Token saved for tenant '{tenant}'.")];
    lines.extend(render(&report));
    Ok(lines)
}

pub fn show(ctx: &AppContext, tenant: &str) -> Result<Vec<String>> {
    Ok(match ctx.credentials.show_token(tenant)? {
        Some(report) => render(&report),
        None => vec![format!("No KSeF token configured for tenant '{tenant}'.")],
    })
}

pub fn clear(ctx: &AppContext, tenant: &str) -> Result<Vec<String>> {
    let line = if ctx.credentials.clear_token(tenant)? {
        format!("Token removed for tenant '{tenant}'.")
    } else {
        format!("Tenant '{tenant}' had no token to remove.")
    };
    Ok(vec![line])
}

/// Only the masked token is ever rendered.
fn render(report: &TokenReport) -> Vec<String> {
    let mut lines = vec![
        format!("Token: {} ({} characters)", report.masked_token, report.token_length),
        format!("Environment: {}", report.environment),
    ];
    lines.extend(report.warnings.iter().map(|warning| format!("Warning: {warning}")));
    lines
}
