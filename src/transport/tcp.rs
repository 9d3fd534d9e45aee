//! TCP transport implementation
//!
//! Provides plain TCP connections to the relay peer.

use super::{resolve_peer, SocketOpts, Transport};
use crate::config::ListenerConfig;
use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;

/// TCP transport for plain connections
#[derive(Debug, Clone)]
pub struct TcpTransport {
    /// Socket options to apply to connections
    socket_opts: SocketOpts,
    /// Connection timeout
    connect_timeout: Duration,
}

impl TcpTransport {
    /// Create a TCP transport from the listener configuration
    pub fn from_config(config: &ListenerConfig) -> Self {
        TcpTransport {
            socket_opts: SocketOpts::from_tcp_config(&config.tcp),
            connect_timeout: config.dial.connect_timeout(),
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    type Stream = TcpStream;

    async fn connect(&self, addr: &str) -> io::Result<Self::Stream> {
        let resolved = resolve_peer(addr).await?;

        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(resolved))
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("Connection timeout to {}", addr),
                )
            })??;

        self.socket_opts.apply_or_warn(&stream);

        tracing::debug!("TCP connection established to {}", resolved);

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use tokio::net::TcpListener;

    fn default_transport() -> TcpTransport {
        TcpTransport::from_config(&ListenerConfig::new(0, 9001, RelayConfig::default()))
    }

    #[test]
    fn test_tcp_transport_default_config() {
        let transport = default_transport();
        assert_eq!(transport.socket_opts, SocketOpts::default());
        assert_eq!(transport.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_tcp_transport_from_config() {
        let mut relay = RelayConfig::default();
        relay.tcp.nodelay = false;
        relay.dial.connect_timeout_secs = 3;
        let config = ListenerConfig::new(9000, 9001, relay);

        let transport = TcpTransport::from_config(&config);
        assert!(!transport.socket_opts.nodelay);
        assert_eq!(transport.connect_timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_tcp_transport_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let transport = default_transport();
        let target = addr.to_string();
        let (stream, accepted) = tokio::join!(transport.connect(&target), listener.accept());

        let stream = stream.unwrap();
        let (_, client_addr) = accepted.unwrap();
        assert_eq!(stream.local_addr().unwrap(), client_addr);
        assert!(stream.nodelay().unwrap());
    }

    #[tokio::test]
    async fn test_tcp_transport_connect_refused() {
        // Grab a free port, then release it so nothing listens there
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut relay = RelayConfig::default();
        relay.dial.connect_timeout_secs = 1;
        let transport = TcpTransport::from_config(&ListenerConfig::new(0, addr.port(), relay));
        let result = transport.connect(&addr.to_string()).await;
        assert!(result.is_err());
    }
}
