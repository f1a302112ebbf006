//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_PUBLIC_KEY_PATH, DEFAULT_SEND_TIMEOUT_SECS,
    DEFAULT_SYSTEM_INFO,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ksef: KsefConfig,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default, skip_serializing)]
    pub encryption_key: Option<String>,
}

/// KSeF client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KsefConfig {
    /// PEM public key used to encrypt the API token.
    #[serde(default = "default_public_key_path")]
    pub public_key_path: String,
    /// Timeout for handshake, status and certificate calls.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
    /// Timeout for the invoice Send call.
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
    /// Replaces the per-environment base URL (staging proxies, tests).
    #[serde(default)]
    pub base_url_override: Option<String>,
    /// `SystemInfo` written into generated invoices.
    #[serde(default = "default_system_info")]
    pub system_info: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "ksef.db".to_string(), pool_size: default_pool_size(), encryption_key: None }
    }
}

impl Default for KsefConfig {
    fn default() -> Self {
        Self {
            public_key_path: default_public_key_path(),
            http_timeout_secs: default_http_timeout(),
            send_timeout_secs: default_send_timeout(),
            base_url_override: None,
            system_info: default_system_info(),
        }
    }
}

fn default_pool_size() -> u32 {
    4
}

fn default_public_key_path() -> String {
    DEFAULT_PUBLIC_KEY_PATH.to_string()
}

fn default_http_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_send_timeout() -> u64 {
    DEFAULT_SEND_TIMEOUT_SECS
}

fn default_system_info() -> String {
    DEFAULT_SYSTEM_INFO.to_string()
}
