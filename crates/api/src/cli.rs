//! Command-line surface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ksef_domain::KsefEnvironment;

#[derive(Parser, Debug)]
#[command(name = "ksef", version, about = "KSeF e-invoicing bridge and JPK_FA import/export")]
pub struct Cli {
    /// Configuration file (JSON or TOML); overrides environment variables
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Manage the KSeF API token of a tenant
    #[command(subcommand)]
    Token(TokenCommand),

    /// Manage the seller profile of a tenant
    #[command(subcommand)]
    Company(CompanyCommand),

    /// Inspect stored invoices
    #[command(subcommand)]
    Invoices(InvoicesCommand),

    /// Send invoices to KSeF, one after another
    Submit {
        #[arg(required = true, value_name = "INVOICE_ID")]
        invoice_ids: Vec<i64>,
    },

    /// Poll the processing status of submitted invoices
    CheckStatus {
        #[arg(required = true, value_name = "INVOICE_ID")]
        invoice_ids: Vec<i64>,
    },

    /// Import invoices from a JPK_FA file
    ImportJpk {
        #[arg(long)]
        tenant: String,
        file: PathBuf,
    },

    /// Export invoices as a JPK_FA(4) file
    ExportJpk {
        #[arg(long)]
        tenant: String,
        #[arg(long, value_name = "FILE")]
        output: PathBuf,
        /// Tax office code written into the header
        #[arg(long, value_name = "CODE")]
        tax_office: Option<String>,
        #[arg(required = true, value_name = "INVOICE_ID")]
        invoice_ids: Vec<i64>,
    },

    /// Check connectivity, remote certificates and the local public key
    Diagnose(DiagnoseArgs),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TokenCommand {
    Set {
        #[arg(long)]
        tenant: String,
        #[arg(long, env = "KSEF_API_TOKEN", hide_env_values = true)]
        token: String,
        #[arg(long, value_enum, default_value_t = EnvironmentArg::Test)]
        environment: EnvironmentArg,
    },
    Show {
        #[arg(long)]
        tenant: String,
    },
    Clear {
        #[arg(long)]
        tenant: String,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CompanyCommand {
    Set {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        nip: String,
        #[arg(long, default_value = "")]
        street: String,
        #[arg(long, default_value = "")]
        zip: String,
        #[arg(long, default_value = "")]
        city: String,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum InvoicesCommand {
    List {
        #[arg(long)]
        tenant: String,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
#[group(multiple = false)]
pub struct DiagnoseArgs {
    /// Use the environment stored for this tenant
    #[arg(long)]
    pub tenant: Option<String>,

    #[arg(long, value_enum)]
    pub environment: Option<EnvironmentArg>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentArg {
    Test,
    #[value(alias = "production")]
    Prod,
}

impl From<EnvironmentArg> for KsefEnvironment {
    fn from(value: EnvironmentArg) -> Self {
        match value {
            EnvironmentArg::Test => KsefEnvironment::Test,
            EnvironmentArg::Prod => KsefEnvironment::Production,
        }
    }
}

impl Command {
    /// Stable name used in command logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Token(TokenCommand::Set { .. }) => "token::set",
            Self::Token(TokenCommand::Show { .. }) => "token::show",
            Self::Token(TokenCommand::Clear { .. }) => "token::clear",
            Self::Company(CompanyCommand::Set { .. }) => "company::set",
            Self::Invoices(InvoicesCommand::List { .. }) => "invoices::list",
            Self::Submit { .. } => "submit",
            Self::CheckStatus { .. } => "check_status",
            Self::ImportJpk { .. } => "import_jpk",
            Self::ExportJpk { .. } => "export_jpk",
            Self::Diagnose(_) => "diagnose",
        }
    }
}
