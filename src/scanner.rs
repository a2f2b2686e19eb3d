use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::services;
use crate::target::{resolve_target, Target};
use crate::types::{ScanEntry, ScanResults};
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use ::time::{format_description::well_known, OffsetDateTime};

/// Probe a single port with a bounded TCP connect. Returns `true` only when
/// the connection was established within `timeout`.
pub async fn probe(ip: IpAddr, port: u16, timeout: Duration) -> bool {
    probe_timed(SocketAddr::new(ip, port), timeout).await.is_some()
}

/// Like [`probe`], but reports the connect latency in milliseconds for open ports.
///
/// Refusal, timeout, unreachable networks and every other socket error all
/// map to `None`.
pub async fn probe_timed(addr: SocketAddr, timeout: Duration) -> Option<u64> {
    let start = Instant::now();
    match time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => Some(start.elapsed().as_millis() as u64),
        _ => None,
    }
}

/// Resolve the configured target and scan its port range.
///
/// Host resolution failures abort before any worker is spawned.
pub async fn run(config: &ScanConfig) -> Result<ScanResults, ScanError> {
    run_with_shared(config, CancellationToken::new(), SharedProgress::new()).await
}

/// Variant of [`run`] with caller-owned cancellation and progress state.
pub async fn run_with_shared(
    config: &ScanConfig,
    cancel: CancellationToken,
    shared: SharedProgress,
) -> Result<ScanResults, ScanError> {
    info!("Starting scan on {} ports {}", config.target, config.range);

    let target = match resolve_target(&config.target).await {
        Ok(t) => t,
        Err(e) => {
            error!("Invalid host: {} ({e})", config.target);
            return Err(e);
        }
    };
    if target.ip.to_string() != target.host {
        debug!("{} resolved to {}", target.host, target.ip);
    }

    let results = scan_range_with_shared(&target, config, cancel, shared).await;

    if results.is_complete() {
        info!("Scan completed on {}", target.host);
    } else {
        warn!(
            "Scan on {} cancelled after {}/{} ports",
            target.host, results.scanned_done, results.scanned_total
        );
    }
    Ok(results)
}

/// Scan every port of `config.range` on an already resolved target.
pub async fn scan_range(target: &Target, config: &ScanConfig) -> ScanResults {
    scan_range_internal(target, config, None, None).await
}

/// Variant that accepts a `CancellationToken` to allow external cancellation.
pub async fn scan_range_with_cancel(
    target: &Target,
    config: &ScanConfig,
    cancel: CancellationToken,
) -> ScanResults {
    scan_range_internal(target, config, Some(cancel), None).await
}

#[derive(Clone, Debug)]
pub struct SharedProgress {
    pub scanned_done: Arc<AtomicU64>,
    pub open_count: Arc<AtomicU64>,
    pub entries: Arc<Mutex<Vec<ScanEntry>>>,
}

impl SharedProgress {
    pub fn new() -> Self {
        Self {
            scanned_done: Arc::new(AtomicU64::new(0)),
            open_count: Arc::new(AtomicU64::new(0)),
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn scanned(&self) -> u64 {
        self.scanned_done.load(Ordering::Relaxed)
    }

    pub fn open(&self) -> u64 {
        self.open_count.load(Ordering::Relaxed)
    }
}

impl Default for SharedProgress {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn scan_range_with_shared(
    target: &Target,
    config: &ScanConfig,
    cancel: CancellationToken,
    shared: SharedProgress,
) -> ScanResults {
    scan_range_internal(target, config, Some(cancel), Some(shared)).await
}

/// Fixed worker pool over a pre-filled port queue.
///
/// - Every port of the range is queued once, then the queue is closed.
/// - `config.worker_count()` workers drain it; each port goes to exactly one worker.
/// - Open ports are pushed into the shared entry list; every probe bumps `scanned_done`.
/// - Entries are sorted by port once all workers have exited.
async fn scan_range_internal(
    target: &Target,
    config: &ScanConfig,
    cancel_opt: Option<CancellationToken>,
    shared_opt: Option<SharedProgress>,
) -> ScanResults {
    let total = config.range.len() as u64;
    let shared = shared_opt.unwrap_or_default();
    let cancel = cancel_opt.unwrap_or_default();

    let (tx, rx) = mpsc::unbounded_channel::<u16>();
    for port in config.range {
        // `rx` is still held here, so sending cannot fail.
        let _ = tx.send(port);
    }
    drop(tx);
    let queue = Arc::new(Mutex::new(rx));

    let pool_target = Arc::new(target.clone());
    let timeout = config.timeout;
    let verbose = config.verbose;

    let mut set = JoinSet::new();
    for _ in 0..config.worker_count() {
        let queue = queue.clone();
        let shared = shared.clone();
        let cancel = cancel.clone();
        let target = pool_target.clone();

        set.spawn(async move {
            loop {
                if cancel.is_cancelled() {
                    break;
                }
                let next = queue.lock().await.recv().await;
                let Some(port) = next else {
                    break;
                };

                match probe_timed(target.socket_addr(port), timeout).await {
                    Some(latency_ms) => {
                        let service = services::resolve(port);
                        info!("Port {port} ({service}) open on {}", target.host);
                        shared.open_count.fetch_add(1, Ordering::Relaxed);
                        let entry = ScanEntry {
                            ip: target.ip.to_string(),
                            port,
                            open: true,
                            service: service.to_string(),
                            latency_ms,
                            timestamp: now_iso_like(),
                        };
                        shared.entries.lock().await.push(entry);
                    }
                    None => {
                        if verbose {
                            debug!("Port {port} closed on {}", target.host);
                        }
                    }
                }

                shared.scanned_done.fetch_add(1, Ordering::Relaxed);
            }
        });
    }

    while let Some(res) = set.join_next().await {
        if let Err(e) = res {
            warn!("scan worker exited abnormally: {e}");
        }
    }

    let mut entries = shared.entries.lock().await.clone();
    entries.sort_unstable_by_key(|e| e.port);

    ScanResults {
        target: target.host.clone(),
        ip: target.ip.to_string(),
        scanned_total: total,
        scanned_done: shared.scanned(),
        open_count: entries.len() as u64,
        entries,
    }
}

fn now_iso_like() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    fn localhost() -> Target {
        Target {
            host: "127.0.0.1".into(),
            ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
        }
    }

    #[tokio::test]
    async fn probe_detects_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(probe(IpAddr::V4(Ipv4Addr::LOCALHOST), port, Duration::from_secs(1)).await);
    }

    #[test]
    fn timestamp_is_utc_rfc3339() {
        let ts = now_iso_like();
        assert!(ts.contains('T'));
        assert!(ts.ends_with('Z'));
    }

    #[tokio::test]
    async fn cancelled_scan_probes_nothing() {
        let cfg = ScanConfig::new("127.0.0.1", 1, 50).unwrap().with_threads(4);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let res = scan_range_with_cancel(&localhost(), &cfg, cancel).await;
        assert_eq!(res.scanned_total, 50);
        assert_eq!(res.scanned_done, 0);
        assert!(!res.is_complete());
        assert!(res.entries.is_empty());
    }

    #[tokio::test]
    async fn shared_progress_tracks_every_probe() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let start = port.saturating_sub(3).max(1);
        let cfg = ScanConfig::new("127.0.0.1", start, port).unwrap();

        let shared = SharedProgress::new();
        let res =
            scan_range_with_shared(&localhost(), &cfg, CancellationToken::new(), shared.clone())
                .await;

        assert_eq!(shared.scanned(), cfg.range.len() as u64);
        assert_eq!(shared.open(), res.open_count);
        assert!(res.entries.iter().any(|e| e.port == port && e.open));
    }
}
