//! Peer dialer
//!
//! Opens the outbound leg of a session. Attempts are spaced by a fixed
//! interval (no exponential growth) and capped at a fixed count; the error
//! of the last attempt is what the session sees.

use crate::config::ListenerConfig;
use crate::error::RelayError;
use crate::transport::{join_host_port, TcpTransport, Transport};
use backoff::backoff::Backoff;
use std::io;
use std::time::Duration;
use tracing::{debug, warn};

/// Constant-interval retry policy with a bounded number of retries
#[derive(Debug, Clone)]
pub struct FixedBackoff {
    interval: Duration,
    retries: u32,
    remaining: u32,
}

impl FixedBackoff {
    /// Policy allowing `max_attempts` attempts in total, `interval` apart
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        let retries = max_attempts.saturating_sub(1);
        FixedBackoff {
            interval,
            retries,
            remaining: retries,
        }
    }
}

impl Backoff for FixedBackoff {
    fn reset(&mut self) {
        self.remaining = self.retries;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.interval)
    }
}

/// Dials the relay peer with bounded, fixed-interval retries
#[derive(Debug)]
pub struct PeerDialer<T: Transport> {
    transport: T,
    max_attempts: u32,
    retry_interval: Duration,
}

impl PeerDialer<TcpTransport> {
    /// Create a TCP dialer from the listener configuration
    pub fn from_config(config: &ListenerConfig) -> Self {
        PeerDialer::new(
            TcpTransport::from_config(config),
            config.dial.max_attempts,
            config.dial.retry_interval(),
        )
    }
}

impl<T: Transport> PeerDialer<T> {
    /// Create a dialer over an arbitrary transport
    pub fn new(transport: T, max_attempts: u32, retry_interval: Duration) -> Self {
        PeerDialer {
            transport,
            max_attempts: max_attempts.max(1),
            retry_interval,
        }
    }

    /// Get a reference to the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Maximum number of attempts per dial
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Connect to `host:port`, retrying on failure
    ///
    /// Returns as soon as one attempt succeeds. After the last failed attempt
    /// the underlying error is returned as [`RelayError::Dial`].
    pub async fn dial(&self, host: &str, port: u16) -> Result<T::Stream, RelayError> {
        let addr = join_host_port(host, port);
        let policy = FixedBackoff::new(self.retry_interval, self.max_attempts);
        let mut attempts = 0u32;

        let result = backoff::future::retry_notify(
            policy,
            || {
                attempts += 1;
                let attempt = attempts;
                let connect = self.transport.connect(&addr);
                async move {
                    connect.await.map_err(|e| {
                        debug!(attempt, error = %e, "Peer dial attempt failed");
                        backoff::Error::transient(e)
                    })
                }
            },
            |e: io::Error, wait: Duration| {
                warn!(peer = %addr, error = %e, retry_in = ?wait, "Peer unreachable, retrying");
            },
        )
        .await;

        match result {
            Ok(stream) => {
                debug!(peer = %addr, attempts, "Peer connected");
                Ok(stream)
            }
            Err(source) => Err(RelayError::Dial {
                addr,
                attempts,
                source,
            }),
        }
    }
}
