//! CLI commands
//!
//! Each command returns the lines to print on stdout. Per-invoice failures
//! inside batch commands are part of the output, not errors.

mod company;
mod diagnose;
mod invoices;
mod jpk;
mod submission;
mod token;

use std::time::Instant;

use ksef_domain::Result;

use crate::cli::{Command, CompanyCommand, InvoicesCommand, TokenCommand};
use crate::context::AppContext;
use crate::utils::logging::log_command_execution;

/// Run `command` and log its outcome.
pub fn execute(ctx: &AppContext, command: Command) -> Result<Vec<String>> {
    let name = command.name();
    let start = Instant::now();

    let result = dispatch(ctx, command);

    let error_type = result.as_ref().err().map(|err| err.label());
    log_command_execution(name, start.elapsed(), error_type);
    result
}

fn dispatch(ctx: &AppContext, command: Command) -> Result<Vec<String>> {
    match command {
        Command::Token(TokenCommand::Set { tenant, token, environment }) => {
            token::set(ctx, &tenant, &token, environment.into())
        }
        Command::Token(TokenCommand::Show { tenant }) => token::show(ctx, &tenant),
        Command::Token(TokenCommand::Clear { tenant }) => token::clear(ctx, &tenant),
        Command::Company(CompanyCommand::Set { tenant, name, nip, street, zip, city }) => {
            company::set(ctx, &tenant, name, nip, street, zip, city)
        }
        Command::Invoices(InvoicesCommand::List { tenant }) => invoices::list(ctx, &tenant),
        Command::Submit { invoice_ids } => Ok(submission::submit(ctx, &invoice_ids)),
        Command::CheckStatus { invoice_ids } => Ok(submission::check_status(ctx, &invoice_ids)),
        Command::ImportJpk { tenant, file } => jpk::import(ctx, &tenant, &file),
        Command::ExportJpk { tenant, output, tax_office, invoice_ids } => {
            jpk::export(ctx, &tenant, &output, tax_office.as_deref(), &invoice_ids)
        }
        Command::Diagnose(args) => diagnose::run(ctx, args),
    }
}
