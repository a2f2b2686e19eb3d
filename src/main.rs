use std::path::PathBuf;
use std::time::Duration;

use port_scan_rs::config::{
    default_csv_path, ScanConfig, DEFAULT_LOG_FILE, DEFAULT_THREADS, DEFAULT_TIMEOUT_MS,
};
use port_scan_rs::ports::{self, PortRange};
use port_scan_rs::progress::{bar_enabled, ProgressReporter};
use port_scan_rs::scanner::{self, SharedProgress};
use port_scan_rs::{logging, output};

use anyhow::{bail, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::error;

/// port-scan-rs — simple threaded TCP connect port scanner.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "port-scan-rs",
    version,
    about = "Simple Port Scanner",
    long_about = None
)]
struct Cli {
    /// Target host (e.g., 'localhost' or '127.0.0.1').
    #[arg(short, long)]
    target: String,

    /// Starting port.
    #[arg(
        short,
        long,
        required_unless_present = "range",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    start: Option<u16>,

    /// Ending port.
    #[arg(
        short,
        long,
        required_unless_present = "range",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    end: Option<u16>,

    /// Port range as START-END, instead of --start/--end.
    #[arg(short, long, conflicts_with_all = ["start", "end"], value_parser = ports::parse_port_range)]
    range: Option<PortRange>,

    /// Number of worker tasks.
    #[arg(short = 'n', long, default_value_t = DEFAULT_THREADS, value_parser = clap::value_parser!(u32).range(1..))]
    threads: u32,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Socket connect timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Log file, appended to on every run.
    #[arg(long = "log-file", default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// CSV output path. Defaults to scan_results_<target>.csv.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Also write results as pretty JSON to this path.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Do not draw the progress bar. Implied by --verbose.
    #[arg(long = "no-progress", default_value_t = false)]
    no_progress: bool,
}

impl Cli {
    fn scan_config(&self) -> Result<ScanConfig> {
        let range = match (self.range, self.start, self.end) {
            (Some(r), _, _) => r,
            (None, Some(s), Some(e)) => PortRange::new(s, e)?,
            _ => bail!("both --start and --end are required"),
        };
        Ok(ScanConfig::for_range(self.target.trim(), range)
            .with_threads(self.threads)
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_verbose(self.verbose))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.scan_config()?;
    let _guard = logging::init_logging(&cli.log_file, cli.verbose)?;

    // Ctrl-C stops workers from taking further ports.
    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        cancel_ctrlc.cancel();
    });

    let shared = SharedProgress::new();
    let progress = if bar_enabled(cli.no_progress, cli.verbose) {
        ProgressReporter::spawn(config.range.len() as u64, shared.clone())
    } else {
        ProgressReporter::hidden()
    };

    let results = match scanner::run_with_shared(&config, cancel, shared).await {
        Ok(results) => {
            progress.finish(results.scanned_done).await;
            results
        }
        Err(e) => {
            progress.clear().await;
            return Err(e.into());
        }
    };

    println!("{}", output::format_summary(&results));
    if cli.verbose {
        output::print_results_table(&results);
    }

    let csv_path = cli
        .csv
        .clone()
        .unwrap_or_else(|| default_csv_path(&config.target));
    match output::write_results_csv(&csv_path, &results) {
        Ok(()) => println!("Results saved to {}", csv_path.display()),
        Err(e) => {
            error!("{e:#}");
            eprintln!("Failed to write CSV to {}: {e:#}", csv_path.display());
        }
    }

    if let Some(path) = cli.json.as_deref() {
        if let Err(e) = output::write_results_json(path, &results) {
            error!("{e:#}");
            eprintln!("Failed to write JSON to {}: {e:#}", path.display());
        } else {
            println!("Wrote JSON results to {}", path.display());
        }
    }

    Ok(())
}
