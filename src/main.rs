//! Avatarlink - Networked Avatar Presence Pipeline
//!
//! Demo driver: runs a session over the built-in synthetic runtime, ticks it
//! at display rate, and logs the packets a transport would consume.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use avatarlink::{
    config::Config,
    native::SyntheticRuntime,
    replication::AvatarPacket,
    AvatarSession,
};

/// Host tick rate for the demo loop, in Hz.
const TICK_RATE: f64 = 60.0;

/// Avatarlink - Networked avatar presence pipeline
#[derive(Parser, Debug)]
#[command(name = "avatarlink", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Packet emission rate in Hz (overrides config)
    #[arg(short, long)]
    rate: Option<f32>,

    /// User identity (overrides config)
    #[arg(short, long)]
    user: Option<String>,

    /// Disable packet recording
    #[arg(long)]
    no_packets: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", avatarlink::NAME, avatarlink::VERSION);

    // Load configuration
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    if let Some(rate) = args.rate {
        config.packets.update_rate_hz = rate;
    }
    if let Some(ref user) = args.user {
        config.session.user_id = user.clone();
    }
    if args.no_packets {
        config.packets.enabled = false;
    }

    // The demo has no real SDK feeding viseme scores; let the synthetic
    // runtime perform
    config.session.capabilities.expressive = true;

    config.validate()?;

    info!("Packet source: {:?}", config.packets.source);
    info!("Packet rate: {} Hz", config.packets.update_rate_hz);
    info!("Lip-sync: onset {}/s, falloff {}/s", config.lipsync.onset_rate, config.lipsync.falloff_rate);

    let runtime = Arc::new(SyntheticRuntime::new());
    let mut session = AvatarSession::new(config, runtime)?;

    // Transport stand-in: log what would go on the wire
    let mut packet_rx = session.subscribe_packets();
    tokio::spawn(async move {
        loop {
            match packet_rx.recv().await {
                Ok(packet) => log_packet(&packet),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    debug!("Transport lagged, {} packets dropped", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    session.start()?;

    // Simulate the native layer loading avatar assets in the background
    for id in [1, 2, 3] {
        session.request_asset_load(id);
    }
    let assets = session.assets();
    tokio::spawn(async move {
        for id in [1u64, 2, 3] {
            tokio::time::sleep(tokio::time::Duration::from_millis(300)).await;
            assets.complete_load(id);
        }
    });

    let ready = session.assets();
    tokio::spawn(async move {
        ready.wait_ready().await;
        info!("Avatar is ready to present");
    });

    // Tick loop: drive the session at display rate with measured deltas
    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs_f64(1.0 / TICK_RATE));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_tick = Instant::now();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = Instant::now();
                let dt = now.duration_since(last_tick).as_secs_f32();
                last_tick = now;
                session.tick(dt);
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    session.teardown();
    info!("Avatarlink stopped");
    Ok(())
}

/// Log one packet the way a transport would see it.
fn log_packet(packet: &AvatarPacket) {
    match packet.encode() {
        Ok(bytes) => {
            let (channel, level) = packet.visemes.dominant();
            debug!(
                "Packet {} at t={:.3}: {} wire bytes, dominant viseme {} ({:.2})",
                packet.sequence,
                packet.timestamp,
                bytes.len(),
                avatarlink::avatar::lipsync::VISEME_NAMES[channel],
                level,
            );
        }
        Err(e) => error!("Failed to encode packet {}: {}", packet.sequence, e),
    }

    // Periodic human-readable snapshot
    if packet.sequence % 300 == 0 {
        match serde_json::to_string(packet) {
            Ok(json) => info!("Packet {}: {}", packet.sequence, json),
            Err(e) => error!("Failed to render packet {}: {}", packet.sequence, e),
        }
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
