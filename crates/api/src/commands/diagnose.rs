use std::path::Path;

use ksef_domain::{KsefEnvironment, Result};
use ksef_infra::ksef::{
    diagnose_connection, ConnectionReport, LocalKeyStatus, SYMMETRIC_KEY_USAGE,
    TOKEN_ENCRYPTION_USAGE,
};

use crate::cli::DiagnoseArgs;
use crate::context::AppContext;

pub fn run(ctx: &AppContext, args: DiagnoseArgs) -> Result<Vec<String>> {
    let environment = match (args.tenant, args.environment) {
        (Some(tenant), _) => ctx
            .credential_store
            .load(&tenant)?
            .map(|credential| credential.ksef_environment)
            .unwrap_or_default(),
        (None, Some(environment)) => environment.into(),
        (None, None) => KsefEnvironment::default(),
    };

    let client = ctx.connector.client(environment)?;
    let report = diagnose_connection(&client, Path::new(&ctx.config.ksef.public_key_path));
    Ok(render_report(&report))
}

/// Human-readable diagnostic, one fact per line.
fn render_report(report: &ConnectionReport) -> Vec<String> {
    let mut lines = vec![format!("Endpoint: {}", report.base_url)];

    match &report.remote_error {
        Some(err) => lines.push(format!("Certificates: unavailable ({err})")),
        None => {
            lines.push(format!("Certificates: {}", report.certificates.len()));
            for cert in &report.certificates {
                lines.push(format!(
                    "  - {} valid {} .. {}{}",
                    cert.usages.join(", "),
                    cert.valid_from.as_deref().unwrap_or("?"),
                    cert.valid_to.as_deref().unwrap_or("?"),
                    cert.der_length.map(|len| format!(" ({len} bytes)")).unwrap_or_default()
                ));
            }
        }
    }

    for usage in [TOKEN_ENCRYPTION_USAGE, SYMMETRIC_KEY_USAGE] {
        let state = if report.has_usage(usage) { "present" } else { "missing" };
        lines.push(format!("Usage {usage}: {state}"));
    }

    let key = match &report.local_key {
        LocalKeyStatus::Valid { bits } => format!("valid RSA key, {bits} bits"),
        LocalKeyStatus::Missing => "missing".to_string(),
        LocalKeyStatus::Invalid { reason } => format!("invalid ({reason})"),
    };
    lines.push(format!("Local key {}: {key}", report.public_key_path));
    lines.push(format!("Healthy: {}", if report.is_healthy() { "yes" } else { "no" }));
    lines
}
