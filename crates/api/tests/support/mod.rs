//! Shared fixtures for command-level integration tests

#![allow(dead_code)]

use std::path::PathBuf;

use ksef_app::cli::Command;
use ksef_app::{commands, AppContext};
use ksef_domain::{Config, DatabaseConfig, KsefConfig, Result};
use tempfile::TempDir;

pub const TENANT: &str = "acme";
pub const VALID_TOKEN: &str = "20240501-EC-0123456789ABCDEF-XYZ";

/// Context over a fresh database in a temporary directory.
pub struct TestApp {
    pub ctx: AppContext,
    temp_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temporary directory");
        let config = Config {
            database: DatabaseConfig {
                path: temp_dir.path().join("data").join("ksef.db").to_string_lossy().into_owned(),
                pool_size: 2,
                encryption_key: None,
            },
            ksef: KsefConfig {
                public_key_path: temp_dir
                    .path()
                    .join("publicKey.pem")
                    .to_string_lossy()
                    .into_owned(),
                http_timeout_secs: 2,
                send_timeout_secs: 2,
                // Nothing listens on the discard port; remote calls fail fast.
                base_url_override: Some("http://127.0.0.1:9".to_string()),
                ..KsefConfig::default()
            },
        };
        let ctx = AppContext::new(config).expect("failed to build application context");
        Self { ctx, temp_dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn run(&self, command: Command) -> Result<Vec<String>> {
        commands::execute(&self.ctx, command)
    }

    pub fn run_ok(&self, command: Command) -> Vec<String> {
        let name = command.name();
        self.run(command).unwrap_or_else(|err| panic!("{name} failed: {err}"))
    }
}

pub const JPK_FA_4: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<JPK xmlns="http://jpk.mf.gov.pl/wzor/2022/02/17/02171/">
  <Faktura>
    <P_1>2024-04-02</P_1><P_2A>FV/10/2024</P_2A><P_3A>Kowalski i Wspólnicy</P_3A>
    <P_3B>ul. Długa 1, 00-001 Warszawa</P_3B><P_5B>111-222-33-44</P_5B>
    <P_6>2024-04-01</P_6><P_15>369,00</P_15><RodzajFaktury>VAT</RodzajFaktury>
  </Faktura>
  <Faktura>
    <P_1>2024-04-05</P_1><P_2A>FV/11/2024</P_2A><P_3A>Jan Nowak</P_3A>
    <P_15>50.00</P_15>
  </Faktura>
  <FakturaWiersz><P_2B>FV/10/2024</P_2B><P_7>Projekt</P_7><P_8A>h</P_8A>
    <P_8B>3</P_8B><P_9A>100,00</P_9A><P_11>300,00</P_11></FakturaWiersz>
  <FakturaWiersz><P_2B>FV/10/2024</P_2B><P_7>Hosting</P_7><P_11>69,00</P_11></FakturaWiersz>
</JPK>
"#;
