//! Linehop - TCP Line Relay
//!
//! This is the main entry point for the Linehop application.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use linehop::config::{load_config, FileConfig, ForwardMode, ListenerConfig};
use linehop::relay::run_relay;
use std::path::PathBuf;
use std::process;
use tokio::sync::broadcast;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Linehop - relay newline-terminated text lines between a client and a fixed peer
#[derive(Parser, Debug)]
#[command(name = "linehop")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Peer port dialed on the local host for every accepted connection
    #[arg(value_name = "FROMPORT")]
    from_port: u16,

    /// Port the relay listens on
    #[arg(value_name = "TOPORT")]
    to_port: u16,

    /// Path to TOML tuning file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to dial instead of the configured peer host
    #[arg(long)]
    peer_host: Option<String>,

    /// Forwarding mode
    #[arg(long, value_enum)]
    mode: Option<ForwardMode>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_log: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();

    // Setup logging
    setup_logging(&args.log_level, args.json_log)?;

    let config = build_config(&args)?;

    info!("Linehop v{}", linehop::VERSION);
    if let Some(path) = &args.config {
        info!("Configuration loaded from: {:?}", path);
    }
    info!("Listening port: {}", config.listen_port);
    info!("Peer: {}", config.peer_addr());

    // Setup shutdown signal
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    // Handle Ctrl+C and termination signals (cross-platform)
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    if let Err(e) = run_relay(config, shutdown_rx).await {
        if e.is_fatal() {
            return Err(e).context("Relay failed to start");
        }
        warn!("Relay stopped: {}", e);
    }

    info!("Relay stopped");
    Ok(())
}

/// Parse arguments; usage errors go to stdout with exit status 1
fn parse_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                process::exit(0);
            }
            _ => {
                print!("{}", e.render());
                process::exit(1);
            }
        },
    }
}

/// Merge the tuning file with command-line overrides
fn build_config(args: &Args) -> Result<ListenerConfig> {
    let file = match &args.config {
        Some(path) => load_config(path)?,
        None => FileConfig::default(),
    };

    let mut relay = file.relay;
    if let Some(host) = &args.peer_host {
        relay.peer_host = host.clone();
    }
    if let Some(mode) = args.mode {
        relay.mode = mode;
    }

    let config = ListenerConfig::new(args.to_port, args.from_port, relay);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Wait for Ctrl+C, or SIGTERM on unix
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Received Ctrl+C, shutting down...");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down...");
                    }
                }
            }
            Err(e) => {
                warn!("Failed to setup SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        // On Windows, only handle Ctrl+C
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C, shutting down...");
    }
}

/// Setup logging based on configuration
fn setup_logging(level: &str, json: bool) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    if json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
