//! Configuration module for Linehop
//!
//! This module provides the tuning file types, their parsing, and the
//! resolved [`ListenerConfig`] the relay runs with.

mod listener;
mod relay;
mod transport;

pub use listener::ListenerConfig;
pub use relay::{DialConfig, FileConfig, ForwardMode, RelayConfig};
pub use transport::TcpConfig;

use anyhow::{Context, Result};
use std::path::Path;

/// Load the tuning file from disk
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    parse_config(&content)
}

/// Parse the tuning file from a TOML string
pub fn parse_config(content: &str) -> Result<FileConfig> {
    toml::from_str(content).with_context(|| "Failed to parse configuration")
}
