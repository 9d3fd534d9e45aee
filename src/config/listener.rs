//! Resolved listener configuration
//!
//! Built once at startup from the command-line ports and the tuning file,
//! then shared read-only by the listener and every session.

use super::{DialConfig, ForwardMode, RelayConfig, TcpConfig};
use crate::error::RelayError;
use crate::transport::join_host_port;
use std::net::{IpAddr, SocketAddr};

/// Final configuration for one relay process
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Port the relay listens on
    pub listen_port: u16,
    /// Interface the relay listens on
    pub bind_host: IpAddr,
    /// Host dialed for every session
    pub peer_host: String,
    /// Port dialed for every session
    pub peer_port: u16,
    /// Forwarding mode for sessions
    pub mode: ForwardMode,
    /// Peer dial settings
    pub dial: DialConfig,
    /// Socket options
    pub tcp: TcpConfig,
}

impl ListenerConfig {
    /// Combine the command-line ports with file settings
    pub fn new(listen_port: u16, peer_port: u16, relay: RelayConfig) -> Self {
        ListenerConfig {
            listen_port,
            bind_host: relay.bind_host,
            peer_host: relay.peer_host,
            peer_port,
            mode: relay.mode,
            dial: relay.dial,
            tcp: relay.tcp,
        }
    }

    /// Address the listener binds
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_host, self.listen_port)
    }

    /// Peer address in `host:port` form
    pub fn peer_addr(&self) -> String {
        join_host_port(&self.peer_host, self.peer_port)
    }

    /// Reject settings the relay cannot run with
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.peer_port == 0 {
            return Err(RelayError::Config("peer port must not be 0".to_string()));
        }
        if self.peer_host.is_empty() {
            return Err(RelayError::Config("peer host must not be empty".to_string()));
        }
        if self.dial.max_attempts == 0 {
            return Err(RelayError::Config(
                "dial.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.dial.connect_timeout_secs == 0 {
            return Err(RelayError::Config(
                "dial.connect_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.tcp.keepalive_secs == 0 || self.tcp.keepalive_interval == 0 {
            return Err(RelayError::Config(
                "tcp.keepalive_secs and tcp.keepalive_interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
