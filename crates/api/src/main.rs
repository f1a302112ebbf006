//! KSeF bridge command-line entry point.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use ksef_app::cli::Cli;
use ksef_app::utils::logging::init_tracing;
use ksef_app::{commands, AppContext};
use ksef_infra::config;

fn main() -> ExitCode {
    // .env must be loaded before the filter reads RUST_LOG
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let cli = Cli::parse();
    match run(cli) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<Vec<String>> {
    let config = match &cli.config {
        Some(path) => config::load_from_file(Some(path.clone()))
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => config::load().context("loading configuration")?,
    };

    let ctx = AppContext::new(config).context("initializing application")?;
    let command = cli.command;
    let name = command.name();
    commands::execute(&ctx, command).with_context(|| format!("command {name} failed"))
}
