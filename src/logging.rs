//! Tracing setup.
//!
//! The TUI owns stdout, so it logs to a file. CLI subcommands log to stderr.
//! Level comes from `RUST_LOG` (default `info` for the log file, `warn` on
//! stderr so it stays out of the way of printed tables).

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{AppError, EXIT_RUNTIME};

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn init_file(path: &Path) -> Result<(), AppError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to open log file '{}': {e}", path.display())))?;

    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to initialize logging: {e}")))
}

pub fn init_stderr() -> Result<(), AppError> {
    tracing_subscriber::registry()
        .with(env_filter("warn"))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to initialize logging: {e}")))
}
