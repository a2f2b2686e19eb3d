use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::types::{ScanEntry, ScanResults};

/// Write open ports as CSV with a `Port,Service` header.
///
/// The file is always created; a scan with no open ports produces a
/// header-only file.
pub fn write_results_csv(path: &Path, results: &ScanResults) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create CSV file: {}", path.display()))?;
    write_csv(file, &results.entries)
        .with_context(|| format!("failed to write CSV file: {}", path.display()))
}

/// CSV body for any writer. Rows follow `entries` order.
pub fn write_csv<W: Write>(writer: W, entries: &[ScanEntry]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Port", "Service"])?;
    for e in entries {
        wtr.write_record([e.port.to_string().as_str(), e.service.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the full results as pretty JSON.
pub fn write_results_json(path: &Path, results: &ScanResults) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create JSON file: {}", path.display()))?;
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}

/// Console summary in the `Port N: service` form.
pub fn format_summary(results: &ScanResults) -> String {
    if results.entries.is_empty() {
        return format!(
            "No open ports found on {} in the specified range.",
            results.target
        );
    }
    let mut out = format!("Open ports on {}:", results.target);
    for (port, service) in results.open_ports() {
        out.push_str(&format!("\nPort {port}: {service}"));
    }
    out
}

/// Aligned table with latency, printed after the summary.
pub fn print_results_table(results: &ScanResults) {
    let port_w = 5usize;
    let mut svc_w = "service".len();
    for e in &results.entries {
        svc_w = svc_w.max(e.service.len());
    }
    let lat_w = "latency_ms".len();

    println!(
        "\nOpen ports: {} (scanned: {}/{})",
        results.open_count, results.scanned_done, results.scanned_total
    );
    if results.entries.is_empty() {
        return;
    }
    println!(
        "{:>port_w$}  {:<svc_w$}  {:>lat_w$}",
        "port",
        "service",
        "latency_ms",
        port_w = port_w,
        svc_w = svc_w,
        lat_w = lat_w
    );
    println!(
        "{:-<port_w$}  {:-<svc_w$}  {:-<lat_w$}",
        "",
        "",
        "",
        port_w = port_w,
        svc_w = svc_w,
        lat_w = lat_w
    );
    for e in &results.entries {
        println!(
            "{:>port_w$}  {:<svc_w$}  {:>lat_w$}",
            e.port,
            e.service,
            e.latency_ms,
            port_w = port_w,
            svc_w = svc_w,
            lat_w = lat_w
        );
    }
}
