//! # Linehop - TCP Line Relay
//!
//! Linehop sits between a client and a server as an extra, controllable hop.
//! It listens on one port and, for every connection it accepts, dials a fixed
//! peer and forwards newline-terminated lines between the two sockets until
//! either side disconnects. Neither endpoint needs to know it is there.
//!
//! ## Features
//!
//! - **Line-atomic forwarding**: each line is forwarded verbatim, terminator
//!   included, and flushed immediately
//! - **Bounded peer dial**: a fixed number of attempts at a fixed interval
//! - **Isolated sessions**: one task per connection, no shared mutable state;
//!   a failing session only ever closes its own two sockets
//! - **Two forwarding modes**: strict alternation between directions, or
//!   both directions pumped independently
//!
//! ## Usage
//!
//! ```rust,ignore
//! use linehop::config::{ListenerConfig, RelayConfig};
//! use linehop::relay::run_relay;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ListenerConfig::new(9000, 9001, RelayConfig::default());
//!     let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     run_relay(config, shutdown_rx).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Client -> RelayListener -> RelaySession -> PeerDialer -> Peer
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod relay;
pub mod transport;

// Re-export commonly used items
pub use config::{load_config, ForwardMode, ListenerConfig};
pub use error::RelayError;
pub use relay::{run_relay, PeerDialer, RelayListener, RelaySession};

/// Version of the Linehop library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
