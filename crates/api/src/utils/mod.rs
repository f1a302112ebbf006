//! Logging helpers shared by the binary and the commands

pub mod logging;
