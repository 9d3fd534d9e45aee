//! Relay listener
//!
//! Binds the listening port and spawns one session task per accepted
//! connection. Sessions are detached: the accept loop never waits on them,
//! and stopping the listener does not drain them.

use super::dialer::PeerDialer;
use super::session::RelaySession;
use crate::config::ListenerConfig;
use crate::error::RelayError;
use crate::transport::{SocketOpts, TcpTransport, Transport};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info, info_span, Instrument};

/// Pause after a failed accept so a persistent error (e.g. fd exhaustion)
/// does not spin the loop
const ACCEPT_ERROR_DELAY: Duration = Duration::from_millis(100);

/// Accepts client connections and relays each one to the peer
pub struct RelayListener<T: Transport> {
    listener: TcpListener,
    config: Arc<ListenerConfig>,
    dialer: Arc<PeerDialer<T>>,
    socket_opts: SocketOpts,
}

impl RelayListener<TcpTransport> {
    /// Validate the configuration and bind the listening socket
    pub async fn bind(config: ListenerConfig) -> Result<Self, RelayError> {
        let dialer = PeerDialer::from_config(&config);
        Self::bind_with_dialer(config, dialer).await
    }
}

impl<T: Transport> RelayListener<T> {
    /// Bind using a custom dialer
    pub async fn bind_with_dialer(
        config: ListenerConfig,
        dialer: PeerDialer<T>,
    ) -> Result<Self, RelayError> {
        config.validate()?;

        let addr = config.listen_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| RelayError::Bind { addr, source })?;

        info!(
            listen = %listener.local_addr().unwrap_or(addr),
            peer = %config.peer_addr(),
            mode = %config.mode,
            "Relay listening"
        );

        Ok(RelayListener {
            listener,
            socket_opts: SocketOpts::from_tcp_config(&config.tcp),
            config: Arc::new(config),
            dialer: Arc::new(dialer),
        })
    }

    /// Address actually bound (useful when the configured port is 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until a shutdown signal arrives
    pub async fn serve(self, mut shutdown_rx: broadcast::Receiver<bool>) {
        let mut next_id: u64 = 0;

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, client_addr)) => {
                            next_id += 1;
                            self.socket_opts.apply_or_warn(&stream);

                            let span = info_span!("session", id = next_id, client = %client_addr);
                            let session = RelaySession::new(
                                next_id,
                                stream,
                                self.dialer.clone(),
                                self.config.clone(),
                            );
                            tokio::spawn(session.run().instrument(span));
                        }
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                            tokio::time::sleep(ACCEPT_ERROR_DELAY).await;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }
    }
}

/// Bind the relay and serve until shutdown
pub async fn run_relay(
    config: ListenerConfig,
    shutdown_rx: broadcast::Receiver<bool>,
) -> Result<(), RelayError> {
    let listener = RelayListener::bind(config).await?;
    listener.serve(shutdown_rx).await;
    Ok(())
}
