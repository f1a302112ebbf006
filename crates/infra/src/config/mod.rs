//! Configuration loading
//!
//! Environment variables first, then a JSON/TOML file, then defaults.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
