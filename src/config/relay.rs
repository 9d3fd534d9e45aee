//! Relay tuning configuration
//!
//! Everything in the optional TOML file. Ports are not part of it; they
//! always come from the command line.

use super::TcpConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

fn default_peer_host() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_max_attempts() -> u32 {
    4
}

fn default_retry_interval_ms() -> u64 {
    1000
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Root of the TOML tuning file
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct FileConfig {
    /// Relay settings
    #[serde(default)]
    pub relay: RelayConfig,
}

/// How a session moves lines between its two legs
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ForwardMode {
    /// One loop alternating inbound->outbound then outbound->inbound
    #[default]
    Alternating,
    /// Each direction pumped on its own; either ending stops the session
    Independent,
}

impl fmt::Display for ForwardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForwardMode::Alternating => write!(f, "alternating"),
            ForwardMode::Independent => write!(f, "independent"),
        }
    }
}

/// Relay settings from the `[relay]` table
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RelayConfig {
    /// Host every session dials
    #[serde(default = "default_peer_host")]
    pub peer_host: String,

    /// Interface the listener binds
    #[serde(default = "default_bind_host")]
    pub bind_host: IpAddr,

    /// Forwarding mode
    #[serde(default)]
    pub mode: ForwardMode,

    /// Peer dial settings
    #[serde(default)]
    pub dial: DialConfig,

    /// Socket options
    #[serde(default)]
    pub tcp: TcpConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            peer_host: default_peer_host(),
            bind_host: default_bind_host(),
            mode: ForwardMode::default(),
            dial: DialConfig::default(),
            tcp: TcpConfig::default(),
        }
    }
}

/// Peer dial settings from `[relay.dial]`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DialConfig {
    /// Total connection attempts, the first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed wait between failed attempts, in milliseconds
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Upper bound for a single attempt, in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for DialConfig {
    fn default() -> Self {
        DialConfig {
            max_attempts: default_max_attempts(),
            retry_interval_ms: default_retry_interval_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl DialConfig {
    /// Wait between failed attempts
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Timeout for a single attempt
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
