use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Log format selector; `json` switches to one JSON object per line.
pub const LOG_FORMAT_ENV: &str = "KSEF_LOG_FORMAT";

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays clean.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling this
/// twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|format| format.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let installed = if json { builder.json().try_init() } else { builder.try_init() };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Log the outcome of a command execution with structured fields.
///
/// `command` must be a stable identifier (e.g. `"token::set"`) and never
/// carry arguments, since those may include secrets.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, error_type: Option<&str>) {
    let duration_ms = elapsed.as_millis() as u64;

    match error_type {
        None => info!(command, duration_ms, "command_execution_success"),
        Some(error_type) => {
            warn!(command, duration_ms, error_type, "command_execution_failure");
        }
    }
}
