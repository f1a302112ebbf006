//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Environment variables, when `KSEF_DB_PATH` is set
//! 2. Otherwise the first config file found by [`probe_config_paths`]
//! 3. Otherwise [`Config::default`]
//!
//! ## Environment Variables
//! - `KSEF_DB_PATH`: Database file path (required for env loading)
//! - `KSEF_DB_POOL_SIZE`: Connection pool size
//! - `KSEF_DB_ENCRYPTION_KEY`: SQLCipher key
//! - `KSEF_PUBLIC_KEY_PATH`: PEM public key used for token encryption
//! - `KSEF_HTTP_TIMEOUT_SECS`: Handshake, status and certificate timeout
//! - `KSEF_SEND_TIMEOUT_SECS`: Invoice Send timeout
//! - `KSEF_BASE_URL`: Overrides the per-environment API root
//! - `KSEF_SYSTEM_INFO`: `SystemInfo` written into generated invoices
//!
//! ## File Locations
//! 1. `./config.{json,toml}` and `./ksef.{json,toml}`
//! 2. The same names in the parent and grandparent directories
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ksef_domain::{Config, DatabaseConfig, KsefConfig, KsefError, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["config.json", "config.toml", "ksef.json", "ksef.toml"];

/// Load configuration with automatic fallback strategy.
///
/// # Errors
/// `Config` when a source exists but is invalid. Missing sources fall
/// through to the next one.
pub fn load() -> Result<Config> {
    if std::env::var_os("KSEF_DB_PATH").is_some() {
        let config = load_from_env()?;
        tracing::info!("configuration loaded from environment variables");
        return Ok(config);
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::debug!("no configuration source found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Load configuration from environment variables.
///
/// # Errors
/// `Config` if `KSEF_DB_PATH` is missing or a numeric variable is invalid.
pub fn load_from_env() -> Result<Config> {
    let defaults = Config::default();

    let database = DatabaseConfig {
        path: env_var("KSEF_DB_PATH")?,
        pool_size: env_parse("KSEF_DB_POOL_SIZE", defaults.database.pool_size)?,
        encryption_key: env_optional("KSEF_DB_ENCRYPTION_KEY"),
    };

    let ksef = KsefConfig {
        public_key_path: env_optional("KSEF_PUBLIC_KEY_PATH")
            .unwrap_or(defaults.ksef.public_key_path),
        http_timeout_secs: env_parse("KSEF_HTTP_TIMEOUT_SECS", defaults.ksef.http_timeout_secs)?,
        send_timeout_secs: env_parse("KSEF_SEND_TIMEOUT_SECS", defaults.ksef.send_timeout_secs)?,
        base_url_override: env_optional("KSEF_BASE_URL"),
        system_info: env_optional("KSEF_SYSTEM_INFO").unwrap_or(defaults.ksef.system_info),
    };

    Ok(Config { database, ksef })
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations. JSON and TOML are
/// detected by extension.
///
/// # Errors
/// `Config` if the file is missing, unreadable or malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(KsefError::Config(format!("config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            KsefError::Config("no config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| KsefError::Config(format!("failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| KsefError::Config(format!("invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| KsefError::Config(format!("invalid JSON format: {e}"))),
        _ => Err(KsefError::Config(format!("unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.is_file())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| KsefError::Config(format!("missing required environment variable: {key}")))
}

/// Set and non-blank, trimmed.
fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_optional(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| KsefError::Config(format!("invalid value for {key}: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::TempDir;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const VARS: [&str; 8] = [
        "KSEF_DB_PATH",
        "KSEF_DB_POOL_SIZE",
        "KSEF_DB_ENCRYPTION_KEY",
        "KSEF_PUBLIC_KEY_PATH",
        "KSEF_HTTP_TIMEOUT_SECS",
        "KSEF_SEND_TIMEOUT_SECS",
        "KSEF_BASE_URL",
        "KSEF_SYSTEM_INFO",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn env_loading_applies_defaults_for_optional_vars() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("KSEF_DB_PATH", "/tmp/ksef-test.db");

        let config = load_from_env().expect("config from env");

        assert_eq!(config.database.path, "/tmp/ksef-test.db");
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.database.encryption_key, None);
        assert_eq!(config.ksef, KsefConfig::default());
        clear_env();
    }

    #[test]
    fn env_loading_reads_every_variable() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("KSEF_DB_PATH", "/tmp/ksef.db");
        std::env::set_var("KSEF_DB_POOL_SIZE", "8");
        std::env::set_var("KSEF_DB_ENCRYPTION_KEY", "secret");
        std::env::set_var("KSEF_PUBLIC_KEY_PATH", "/etc/ksef/key.pem");
        std::env::set_var("KSEF_HTTP_TIMEOUT_SECS", "3");
        std::env::set_var("KSEF_SEND_TIMEOUT_SECS", "30");
        std::env::set_var("KSEF_BASE_URL", "http://127.0.0.1:9000/api");
        std::env::set_var("KSEF_SYSTEM_INFO", "bridge-ci");

        let config = load_from_env().expect("config from env");

        assert_eq!(config.database.pool_size, 8);
        assert_eq!(config.database.encryption_key.as_deref(), Some("secret"));
        assert_eq!(config.ksef.public_key_path, "/etc/ksef/key.pem");
        assert_eq!(config.ksef.http_timeout_secs, 3);
        assert_eq!(config.ksef.send_timeout_secs, 30);
        assert_eq!(config.ksef.base_url_override.as_deref(), Some("http://127.0.0.1:9000/api"));
        assert_eq!(config.ksef.system_info, "bridge-ci");
        clear_env();
    }

    #[test]
    fn invalid_number_is_a_config_error() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("KSEF_DB_PATH", "/tmp/ksef.db");
        std::env::set_var("KSEF_SEND_TIMEOUT_SECS", "soon");

        let err = load_from_env().unwrap_err();

        assert!(matches!(err, KsefError::Config(msg) if msg.contains("KSEF_SEND_TIMEOUT_SECS")));
        clear_env();
    }

    #[test]
    fn missing_db_path_is_a_config_error() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        assert!(matches!(load_from_env(), Err(KsefError::Config(_))));
    }

    #[test]
    fn toml_file_fills_missing_sections_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ksef.toml");
        std::fs::write(&path, "[database]\npath = \"data/ksef.db\"\npool_size = 2\n").unwrap();

        let config = load_from_file(Some(path)).expect("config from toml");

        assert_eq!(config.database.path, "data/ksef.db");
        assert_eq!(config.database.pool_size, 2);
        assert_eq!(config.ksef.http_timeout_secs, 10);
        assert_eq!(config.ksef.send_timeout_secs, 15);
    }

    #[test]
    fn json_file_is_parsed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"database": {"path": "a.db"}, "ksef": {"base_url_override": "http://x"}}"#,
        )
        .unwrap();

        let config = load_from_file(Some(path)).expect("config from json");

        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.ksef.base_url_override.as_deref(), Some("http://x"));
    }

    #[test]
    fn unsupported_extension_and_missing_file_are_rejected() {
        assert!(parse_config("a: b", Path::new("config.yaml")).is_err());
        assert!(matches!(
            load_from_file(Some(PathBuf::from("/nonexistent/ksef.toml"))),
            Err(KsefError::Config(_))
        ));
    }
}
