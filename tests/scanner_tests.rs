use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use port_scan_rs::config::ScanConfig;
use port_scan_rs::scanner::{probe, run, scan_range};
use port_scan_rs::target::Target;
use tokio::net::TcpListener;

fn localhost() -> Target {
    Target {
        host: "127.0.0.1".into(),
        ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
    }
}

/// A port that had a listener a moment ago and now has none.
async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Range of five ports with listeners on the first and, when it can be
/// bound, the fourth. Returns the listeners (keep them alive), the range
/// bounds and the listening ports.
async fn listeners_in_window() -> (Vec<TcpListener>, u16, u16, Vec<u16>) {
    let first = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = first.local_addr().unwrap().port();
    let (start, end, other) = if base <= 65531 {
        (base, base + 4, base + 3)
    } else {
        (base - 4, base, base - 3)
    };

    let mut listeners = vec![first];
    let mut open = vec![base];
    if let Ok(l) = TcpListener::bind(("127.0.0.1", other)).await {
        listeners.push(l);
        open.push(other);
    }
    open.sort_unstable();
    (listeners, start, end, open)
}

#[tokio::test]
async fn probe_open_port() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    assert!(probe(IpAddr::V4(Ipv4Addr::LOCALHOST), port, Duration::from_secs(1)).await);
}

#[tokio::test]
async fn probe_closed_port_within_timeout() {
    let port = free_port().await;
    let timeout = Duration::from_millis(500);
    let started = Instant::now();
    assert!(!probe(IpAddr::V4(Ipv4Addr::LOCALHOST), port, timeout).await);
    assert!(started.elapsed() < timeout + Duration::from_millis(500));
}

#[tokio::test]
async fn every_port_probed_exactly_once() {
    let (_listeners, start, end, open) = listeners_in_window().await;
    let cfg = ScanConfig::new("127.0.0.1", start, end)
        .unwrap()
        .with_threads(3)
        .with_timeout(Duration::from_millis(500));

    let res = scan_range(&localhost(), &cfg).await;

    assert_eq!(res.scanned_total, u64::from(end - start) + 1);
    assert_eq!(res.scanned_done, res.scanned_total);
    assert!(res.is_complete());

    let found: Vec<u16> = res.entries.iter().map(|e| e.port).collect();
    for port in &open {
        assert!(found.contains(port), "listener on {port} not reported");
    }
    assert!(res.entries.iter().all(|e| e.open && cfg.range.contains(e.port)));
}

#[tokio::test]
async fn results_sorted_without_duplicates() {
    let (_listeners, start, end, _open) = listeners_in_window().await;
    let cfg = ScanConfig::new("127.0.0.1", start, end)
        .unwrap()
        .with_threads(100)
        .with_timeout(Duration::from_millis(500));

    let res = scan_range(&localhost(), &cfg).await;
    let ports: Vec<u16> = res.entries.iter().map(|e| e.port).collect();
    let unique: HashSet<u16> = ports.iter().copied().collect();

    assert!(ports.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(unique.len(), ports.len());
    assert_eq!(res.open_count, ports.len() as u64);
}

#[tokio::test]
async fn thread_count_does_not_change_results() {
    let (_listeners, start, end, _open) = listeners_in_window().await;
    let base = ScanConfig::new("127.0.0.1", start, end)
        .unwrap()
        .with_timeout(Duration::from_millis(500));

    let single = scan_range(&localhost(), &base.clone().with_threads(1)).await;
    let many = scan_range(&localhost(), &base.with_threads(100)).await;

    assert_eq!(single.open_ports(), many.open_ports());
}

#[tokio::test]
async fn no_listeners_gives_empty_results() {
    let port = free_port().await;
    let cfg = ScanConfig::new("127.0.0.1", port, port)
        .unwrap()
        .with_timeout(Duration::from_millis(500));

    let res = run(&cfg).await.expect("localhost resolves");
    assert!(res.entries.is_empty());
    assert_eq!(res.scanned_done, 1);
    assert_eq!(res.target, "127.0.0.1");
}

#[tokio::test]
async fn open_port_gets_service_label() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let cfg = ScanConfig::new("127.0.0.1", port, port).unwrap();

    let res = run(&cfg).await.unwrap();
    assert_eq!(res.entries.len(), 1);
    assert_eq!(res.entries[0].service, port_scan_rs::services::resolve(port));
    assert_eq!(res.entries[0].ip, "127.0.0.1");
}

#[tokio::test]
async fn unresolvable_host_aborts_before_probing() {
    let cfg = ScanConfig::new("no-such-host.invalid", 1, 10).unwrap();
    let err = run(&cfg).await.unwrap_err();
    assert!(err.is_resolution(), "unexpected error: {err}");
}
