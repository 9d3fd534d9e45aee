//! Test utilities for Linehop integration tests
//!
//! Ephemeral listeners, a scriptable line-echo peer, and relay startup.

#![allow(dead_code)]

use linehop::config::{ForwardMode, ListenerConfig, RelayConfig};
use linehop::relay::RelayListener;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

/// Upper bound for any single wait in the tests
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// A port with nothing listening on it (released right after probing)
pub async fn unused_port() -> u16 {
    let (listener, addr) = create_test_listener().await;
    drop(listener);
    addr.port()
}

/// Spawn a peer that echoes every line back on every connection
///
/// A connection that receives `quit\n` is dropped without a reply.
pub async fn spawn_echo_peer() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    tokio::spawn(serve_echo(listener));
    addr
}

/// Echo loop for an already-bound listener
pub async fn serve_echo(listener: TcpListener) {
    while let Ok((stream, _)) = listener.accept().await {
        tokio::spawn(echo_lines(stream));
    }
}

async fn echo_lines(stream: TcpStream) {
    let mut stream = BufReader::new(stream);
    let mut line = Vec::new();
    loop {
        line.clear();
        match stream.read_until(b'\n', &mut line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        if line == b"quit\n" {
            return;
        }
        if stream.write_all(&line).await.is_err() || stream.flush().await.is_err() {
            return;
        }
    }
}

/// Relay settings tuned for tests: loopback only, short retry interval
pub fn test_config(peer_port: u16, mode: ForwardMode, retry_interval_ms: u64) -> ListenerConfig {
    let mut relay = RelayConfig {
        bind_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        mode,
        ..Default::default()
    };
    relay.dial.retry_interval_ms = retry_interval_ms;
    ListenerConfig::new(0, peer_port, relay)
}

/// Running relay; dropping it stops the accept loop
pub struct TestRelay {
    pub addr: SocketAddr,
    shutdown_tx: broadcast::Sender<bool>,
}

impl TestRelay {
    pub async fn start(config: ListenerConfig) -> Self {
        let listener = RelayListener::bind(config).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        tokio::spawn(listener.serve(shutdown_rx));
        TestRelay { addr, shutdown_tx }
    }

    pub async fn connect(&self) -> BufReader<TcpStream> {
        BufReader::new(TcpStream::connect(self.addr).await.unwrap())
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Read one line with a timeout; `None` means the connection closed
pub async fn read_line(stream: &mut BufReader<TcpStream>) -> Option<String> {
    let mut line = String::new();
    let n = tokio::time::timeout(STEP_TIMEOUT, stream.read_line(&mut line))
        .await
        .expect("timed out waiting for a line")
        .ok()?;
    if n == 0 {
        None
    } else {
        Some(line)
    }
}

/// Write one line and flush it
pub async fn send(stream: &mut BufReader<TcpStream>, line: &str) {
    stream.write_all(line.as_bytes()).await.unwrap();
    stream.flush().await.unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_listener() {
        let (listener, addr) = create_test_listener().await;
        assert!(addr.port() > 0);
        drop(listener);
    }

    #[tokio::test]
    async fn test_echo_peer() {
        let addr = spawn_echo_peer().await;
        let mut stream = BufReader::new(TcpStream::connect(addr).await.unwrap());
        send(&mut stream, "hello\n").await;
        assert_eq!(read_line(&mut stream).await.as_deref(), Some("hello\n"));
        send(&mut stream, "quit\n").await;
        assert_eq!(read_line(&mut stream).await, None);
    }
}
