use std::net::{IpAddr, SocketAddr};

use serde::Serialize;
use tokio::net::lookup_host;

use crate::error::ScanError;

/// A scan target: the host as the user wrote it plus the address it resolved to.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub ip: IpAddr,
}

impl Target {
    pub fn socket_addr(&self, port: u16) -> SocketAddr {
        SocketAddr::new(self.ip, port)
    }
}

/// Resolve a hostname or IP literal to a single address.
///
/// IP literals skip DNS entirely. For names, the first IPv4 address wins;
/// an IPv6-only name falls back to its first address.
pub async fn resolve_target(host: &str) -> Result<Target, ScanError> {
    let host = host.trim();
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(Target { host: host.to_string(), ip });
    }

    let addrs: Vec<SocketAddr> = lookup_host((host, 0))
        .await
        .map_err(|source| ScanError::Resolve {
            host: host.to_string(),
            source,
        })?
        .collect();

    pick_address(&addrs)
        .map(|ip| Target { host: host.to_string(), ip })
        .ok_or_else(|| ScanError::NoAddress {
            host: host.to_string(),
        })
}

fn pick_address(addrs: &[SocketAddr]) -> Option<IpAddr> {
    addrs
        .iter()
        .map(SocketAddr::ip)
        .find(IpAddr::is_ipv4)
        .or_else(|| addrs.first().map(SocketAddr::ip))
}
