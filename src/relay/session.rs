//! Relay session
//!
//! One accepted connection paired with one dialed peer connection. The
//! session owns both legs from the moment it has them and closes both before
//! it finishes; nothing it hits is reported past its own task.

use super::dialer::PeerDialer;
use super::forward;
use crate::config::{ForwardMode, ListenerConfig};
use crate::error::RelayError;
use crate::transport::Transport;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    /// Waiting for the peer connection
    Dialing,
    /// Forwarding lines between the legs
    Relaying,
    /// Both legs closed; terminal
    Closed,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer could not be reached
    DialFailed,
    /// The client closed its side
    InboundClosed,
    /// The peer closed its side
    OutboundClosed,
    /// I/O fault on the client leg
    InboundError,
    /// I/O fault on the peer leg
    OutboundError,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CloseReason::DialFailed => "dial failed",
            CloseReason::InboundClosed => "client closed",
            CloseReason::OutboundClosed => "peer closed",
            CloseReason::InboundError => "client error",
            CloseReason::OutboundError => "peer error",
        };
        f.write_str(s)
    }
}

/// Traffic forwarded in one direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionStats {
    /// Lines forwarded
    pub lines: u64,
    /// Bytes forwarded, terminators included
    pub bytes: u64,
}

impl DirectionStats {
    pub(crate) fn record(&mut self, bytes: usize) {
        self.lines += 1;
        self.bytes += bytes as u64;
    }
}

/// What a finished session reports
#[derive(Debug)]
pub struct SessionSummary {
    /// Session id assigned by the listener
    pub id: u64,
    /// Why the session ended
    pub reason: CloseReason,
    /// The absorbed error behind a `DialFailed` or `*Error` close
    pub error: Option<RelayError>,
    /// Client to peer traffic
    pub upstream: DirectionStats,
    /// Peer to client traffic
    pub downstream: DirectionStats,
    /// Time from start to close
    pub duration: Duration,
}

/// A single relayed connection
pub struct RelaySession<S, T: Transport> {
    id: u64,
    inbound: S,
    dialer: Arc<PeerDialer<T>>,
    config: Arc<ListenerConfig>,
    state: SessionState,
}

impl<S, T> RelaySession<S, T>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    T: Transport,
{
    /// Create a session for an accepted connection
    pub fn new(id: u64, inbound: S, dialer: Arc<PeerDialer<T>>, config: Arc<ListenerConfig>) -> Self {
        RelaySession {
            id,
            inbound,
            dialer,
            config,
            state: SessionState::Dialing,
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert_ne!(self.state, SessionState::Closed, "session resurrected");
        debug!(from = ?self.state, to = ?next, "Session state change");
        self.state = next;
    }

    /// Dial the peer, forward until either side ends, close both legs
    pub async fn run(mut self) -> SessionSummary {
        let start = Instant::now();

        let outbound = match self
            .dialer
            .dial(&self.config.peer_host, self.config.peer_port)
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Closing client connection: {}", e);
                if let Err(e) = self.inbound.shutdown().await {
                    debug!(error = %e, "Error while closing inbound leg");
                }
                self.transition(SessionState::Closed);
                return SessionSummary {
                    id: self.id,
                    reason: CloseReason::DialFailed,
                    error: Some(e),
                    upstream: DirectionStats::default(),
                    downstream: DirectionStats::default(),
                    duration: start.elapsed(),
                };
            }
        };

        self.transition(SessionState::Relaying);

        let outcome = match self.config.mode {
            ForwardMode::Alternating => forward::alternating(&mut self.inbound, outbound).await,
            ForwardMode::Independent => forward::independent(&mut self.inbound, outbound).await,
        };

        self.transition(SessionState::Closed);

        if let Some(e) = &outcome.error {
            debug!(error = %e, "Transport fault absorbed");
        }

        let summary = SessionSummary {
            id: self.id,
            reason: outcome.reason,
            error: outcome.error,
            upstream: outcome.upstream,
            downstream: outcome.downstream,
            duration: start.elapsed(),
        };

        info!(
            reason = %summary.reason,
            lines_up = summary.upstream.lines,
            lines_down = summary.downstream.lines,
            bytes_up = summary.upstream.bytes,
            bytes_down = summary.downstream.bytes,
            duration = ?summary.duration,
            "Session closed"
        );

        summary
    }
}
