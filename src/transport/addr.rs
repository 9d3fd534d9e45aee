//! Peer address resolution
//!
//! The relay dials IPv4 first: `localhost` commonly resolves to `::1` ahead
//! of `127.0.0.1`, while test peers usually listen on IPv4 only.

use std::io;
use std::net::SocketAddr;
use tokio::net::lookup_host;

/// Join a host and port, bracketing bare IPv6 literals
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Resolve `host:port`, preferring an IPv4 result when there is one
pub async fn resolve_peer(addr: &str) -> io::Result<SocketAddr> {
    let resolved: Vec<SocketAddr> = lookup_host(addr).await?.collect();

    resolved
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| resolved.first())
        .copied()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("No addresses found for: {}", addr),
            )
        })
}
