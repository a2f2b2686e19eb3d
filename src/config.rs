use std::path::PathBuf;
use std::time::Duration;

use crate::error::ScanError;
use crate::ports::PortRange;

pub const DEFAULT_THREADS: u32 = 100;
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_LOG_FILE: &str = "port_scan.log";

/// Scan parameters, validated once at startup.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub target: String,
    pub range: PortRange,
    pub threads: u32,
    pub timeout: Duration,
    pub verbose: bool,
}

impl ScanConfig {
    pub fn new(target: impl Into<String>, start: u16, end: u16) -> Result<Self, ScanError> {
        Ok(Self::for_range(target, PortRange::new(start, end)?))
    }

    pub fn for_range(target: impl Into<String>, range: PortRange) -> Self {
        Self {
            target: target.into(),
            range,
            threads: DEFAULT_THREADS,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            verbose: false,
        }
    }

    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Workers actually spawned: never more than there are ports to probe.
    pub fn worker_count(&self) -> usize {
        (self.threads.max(1) as usize).min(self.range.len())
    }
}

/// Default CSV path for a target: `scan_results_<target>.csv`.
///
/// Path separators and `:` (IPv6 literals) are replaced so the name stays a
/// single file in the working directory.
pub fn default_csv_path(target: &str) -> PathBuf {
    let safe: String = target
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect();
    PathBuf::from(format!("scan_results_{safe}.csv"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ScanConfig::new("localhost", 1, 1024).unwrap();
        assert_eq!(cfg.threads, 100);
        assert_eq!(cfg.timeout, Duration::from_millis(1000));
        assert!(!cfg.verbose);
    }

    #[test]
    fn worker_count_is_capped_by_range() {
        let cfg = ScanConfig::new("localhost", 80, 84).unwrap();
        assert_eq!(cfg.worker_count(), 5);
        let cfg = cfg.with_threads(2);
        assert_eq!(cfg.worker_count(), 2);
        let cfg = cfg.with_threads(0);
        assert_eq!(cfg.worker_count(), 1);
    }

    #[test]
    fn invalid_range_rejected() {
        assert!(ScanConfig::new("localhost", 500, 20).is_err());
    }

    #[test]
    fn csv_name_from_target() {
        assert_eq!(
            default_csv_path("127.0.0.1"),
            PathBuf::from("scan_results_127.0.0.1.csv")
        );
        assert_eq!(default_csv_path("::1"), PathBuf::from("scan_results___1.csv"));
    }
}
