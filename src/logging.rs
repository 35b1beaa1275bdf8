//! Tracing setup.
//!
//! Headless modes log to stderr. The TUI owns the terminal, so it logs to a
//! daily-rolled file instead.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "workflow-sim.log";

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("workflow_sim=debug,warn")
        } else {
            EnvFilter::new("workflow_sim=warn,warn")
        }
    })
}

/// Directory for TUI log files.
pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("workflow-sim").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

pub fn init_stderr(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter(verbose)),
        )
        .try_init();
}

/// Route logs to a file. Keep the guard alive until exit so buffered lines are flushed.
#[cfg_attr(not(feature = "tui"), allow(dead_code))]
pub fn init_file(verbose: bool) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(log_dir(), LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(filter(verbose)),
        )
        .try_init();
    guard
}
