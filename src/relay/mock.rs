//! In-memory transport for relay unit tests

use crate::transport::Transport;
use async_trait::async_trait;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::io::{duplex, DuplexStream};
use tokio::sync::mpsc;

/// Transport refusing the first `failures` attempts, then handing out
/// duplex pipes whose far ends are sent to the test
#[derive(Debug)]
pub(crate) struct MockTransport {
    failures: u32,
    attempts: AtomicU32,
    peers: mpsc::UnboundedSender<DuplexStream>,
}

impl MockTransport {
    pub(crate) fn failing(failures: u32) -> (Self, mpsc::UnboundedReceiver<DuplexStream>) {
        let (peers, rx) = mpsc::unbounded_channel();
        let transport = MockTransport {
            failures,
            attempts: AtomicU32::new(0),
            peers,
        };
        (transport, rx)
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Stream = DuplexStream;

    async fn connect(&self, _addr: &str) -> io::Result<Self::Stream> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ));
        }

        let (near, far) = duplex(4096);
        self.peers
            .send(far)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "test dropped peer receiver"))?;
        Ok(near)
    }
}
