//! Log setup: an append-only scan log file plus a quiet console layer.
//!
//! The file receives scan start, every open port and scan completion at
//! INFO. The console only shows warnings unless `--verbose` is given, in
//! which case every probed port is reported. `RUST_LOG` overrides the
//! console filter.

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the global subscriber.
///
/// A log file that cannot be opened does not stop the scan: the subscriber
/// is installed console-only, the failure is reported on stderr and `None`
/// is returned instead of a guard. Keep a returned guard alive until exit,
/// or buffered file lines are lost.
pub fn init_logging(log_file: &Path, verbose: bool) -> Result<Option<WorkerGuard>> {
    let opened = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("failed to open log file: {}", log_file.display()));

    let (file_layer, guard, file_error) = match opened {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(LevelFilter::INFO);
            (Some(layer), Some(guard), None)
        }
        Err(e) => (None, None, Some(e)),
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .with_filter(console_filter(verbose));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    if let Some(e) = file_error {
        eprintln!("Warning: {e:#}; continuing without a log file");
    }

    Ok(guard)
}

fn console_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "port_scan_rs=debug,warn" } else { "warn" })
    })
}
