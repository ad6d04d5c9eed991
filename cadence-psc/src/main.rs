//! Playback Session Coordinator (cadence-psc) - Main entry point
//!
//! Starts one playback session, its spectrum sampler and the HTTP/SSE/
//! WebSocket boundary, then serves until Ctrl+C or SIGTERM.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cadence_common::config::{load_or_default, resolve_config_path};
use cadence_psc::config::{TomlConfig, DEFAULT_PORT};
use cadence_psc::{PlaybackSession, SessionOptions};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for cadence-psc
#[derive(Parser, Debug)]
#[command(name = "cadence-psc")]
#[command(about = "Playback Session Coordinator for Cadence")]
#[command(version)]
struct Args {
    /// Port to listen on [default: 5750]
    #[arg(short, long, env = "CADENCE_PORT")]
    port: Option<u16>,

    /// Address to bind [default: 0.0.0.0]
    #[arg(short, long)]
    bind: Option<IpAddr>,

    /// Path to TOML config file
    #[arg(short, long, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Fixed RNG seed for reproducible shuffle orders
    #[arg(long)]
    seed: Option<u64>,

    /// Run without an audio engine (control only, synthetic spectrum)
    #[arg(long)]
    no_engine: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first: it decides the default log level
    let config_path = resolve_config_path(args.config.as_deref(), "CADENCE_CONFIG", "cadence");
    let (config, loaded_from): (TomlConfig, _) = load_or_default(config_path.as_deref());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("cadence_psc={0},cadence_common={0},tower_http=info", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting cadence-psc v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE"),
    );
    match (&config_path, &loaded_from) {
        (_, Some(path)) => info!("Configuration: {}", path.display()),
        (Some(path), None) => warn!("Could not load {}, using compiled defaults", path.display()),
        (None, None) => info!("Configuration: compiled defaults"),
    }

    let bind = match args.bind {
        Some(ip) => ip,
        None => config
            .bind
            .as_deref()
            .unwrap_or("0.0.0.0")
            .parse()
            .context("Invalid bind address in config")?,
    };
    let port = args.port.or(config.port).unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::new(bind, port);

    let mut options = SessionOptions::from_config(&config);
    options.seed = args.seed;
    if args.no_engine {
        warn!("Running without an audio engine: commands apply, audio stays silent");
        options.engine = None;
    }

    let session = Arc::new(PlaybackSession::new(options));
    let sampler = session.spawn_sampler();
    info!("Playback session ready");

    cadence_psc::api::run(addr, Arc::clone(&session), shutdown_signal())
        .await
        .context("HTTP server failed")?;

    if let Some(handle) = sampler {
        handle.abort();
    }
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
