//! Error types for Linehop
//!
//! The relay distinguishes errors by scope. Session-scoped errors are
//! absorbed by the session that hit them: they end up in its
//! `SessionSummary` and the clients only see a closed connection. Startup
//! errors abort the process. Any unexpected I/O error converts to
//! `Transport`.
//!
//! | Kind        | Scope    | Policy                                  |
//! |-------------|----------|-----------------------------------------|
//! | `Dial`      | session  | absorbed, inbound connection closed     |
//! | `Transport` | session  | absorbed, both legs closed              |
//! | `Bind`      | startup  | fatal, process exits with a diagnostic  |
//! | `Config`    | startup  | fatal, process exits with a diagnostic  |

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Main error type for relay operations
#[derive(Error, Debug)]
pub enum RelayError {
    /// The peer could not be reached after all dial attempts
    #[error("Peer {addr} unreachable after {attempts} attempts: {source}")]
    Dial {
        /// Peer address as configured (host:port)
        addr: String,
        /// Number of attempts made
        attempts: u32,
        /// Error returned by the last attempt
        #[source]
        source: io::Error,
    },

    /// Read or write fault on either leg of a session
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// The listening socket could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address the listener tried to bind
        addr: SocketAddr,
        /// Underlying bind error
        #[source]
        source: io::Error,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RelayError {
    /// Whether this error must abort the process rather than a single session
    pub fn is_fatal(&self) -> bool {
        matches!(self, RelayError::Bind { .. } | RelayError::Config(_))
    }
}
