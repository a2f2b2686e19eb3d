use serde::{Deserialize, Serialize};

/// One open port found during a scan.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub ip: String,
    pub port: u16,
    pub open: bool,
    pub service: String,
    pub latency_ms: u64,
    pub timestamp: String,
}

/// Aggregate results and progress counters. `entries` holds open ports only,
/// sorted by port ascending once the scan has finished.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ScanResults {
    pub target: String,
    pub ip: String,
    pub scanned_total: u64,
    pub scanned_done: u64,
    pub open_count: u64,
    pub entries: Vec<ScanEntry>,
}

impl ScanResults {
    /// `(port, service)` pairs in result order.
    pub fn open_ports(&self) -> Vec<(u16, &str)> {
        self.entries
            .iter()
            .map(|e| (e.port, e.service.as_str()))
            .collect()
    }

    /// False when the scan was cancelled before every port was probed.
    pub fn is_complete(&self) -> bool {
        self.scanned_done == self.scanned_total
    }
}
