//! Touch fusion service (seamtouch-fusion) - Main entry point
//!
//! Runs the full fusion pipeline against a replay scenario in place of
//! sensor hardware and logs the resulting pointer reports.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seamtouch_common::config::FusionConfig;
use seamtouch_common::positions::PositionAssignments;
use seamtouch_fusion::replay::Scenario;
use seamtouch_fusion::runtime::{Pipeline, TracingSink};

/// Command-line arguments for seamtouch-fusion
#[derive(Parser, Debug)]
#[command(name = "seamtouch-fusion")]
#[command(about = "Fuses edge-mounted touch sensors into one pointer stream")]
#[command(version)]
struct Args {
    /// Bootstrap configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replay scenario standing in for sensor hardware
    #[arg(short, long, env = "SEAMTOUCH_SCENARIO")]
    scenario: PathBuf,

    /// Log rejected samples and filter decisions
    #[arg(short, long)]
    verbose: bool,

    /// Persisted sensor positions file (overrides the config file)
    #[arg(long, env = "SEAMTOUCH_POSITIONS_FILE")]
    positions_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let mut config =
        FusionConfig::load_or_default(args.config.as_deref()).context("Failed to load configuration")?;
    if args.verbose {
        config.logging.verbose = true;
    }
    if let Some(path) = args.positions_file {
        config.positions_file = Some(path);
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_directive().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting seamtouch-fusion: {} mounting, surface {}x{}, sensors {:?}",
        config.orientation, config.surface_width, config.surface_height, config.sensors
    );

    let assignments = match &config.positions_file {
        Some(path) => PositionAssignments::load(path)
            .with_context(|| format!("Failed to load positions file {}", path.display()))?,
        None => None,
    };
    if let Some(assignments) = &assignments {
        if !assignments.covers(&config.sensors) {
            warn!("Positions file does not cover every expected sensor; it will be rewritten once all sensors connect");
        }
    }

    let scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("Failed to load scenario {}", args.scenario.display()))?;

    let pipeline = Pipeline::start(&config, scenario.into_slots(), Box::new(TracingSink), assignments)
        .context("Failed to start fusion pipeline")?;
    let stop = pipeline.shutdown_signal();

    let mut supervisor = tokio::task::spawn_blocking(move || pipeline.join());

    let outcome = tokio::select! {
        finished = &mut supervisor => finished,
        _ = shutdown_signal() => {
            stop.request();
            supervisor.await
        }
    };

    outcome
        .context("Pipeline supervisor task failed")?
        .context("Fusion stopped on a fatal error")?;

    info!("seamtouch-fusion shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
