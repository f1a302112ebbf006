//! # KSeF App
//!
//! Command-line application layer.
//!
//! This crate contains:
//! - The clap command surface
//! - Application context (dependency injection)
//! - Command handlers that render plain-text output
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires the SQLite repositories and the KSeF HTTP client into core services

pub mod cli;
pub mod commands;
pub mod context;
pub mod utils;

pub use context::AppContext;
