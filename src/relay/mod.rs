//! Relay module for Linehop
//!
//! This module contains the relay itself: the listener accepting client
//! connections, the per-connection session, the peer dialer and the line
//! forwarding loops.

mod dialer;
mod forward;
mod listener;
#[cfg(test)]
mod mock;
mod session;

pub use dialer::{FixedBackoff, PeerDialer};
pub use listener::{run_relay, RelayListener};
pub use session::{CloseReason, DirectionStats, RelaySession, SessionSummary};
