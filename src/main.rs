//! CLI Entry Point for motion-daq
//!
//! Provides the command-line interface for running a headless movement
//! monitoring session. The session is wired entirely from library components:
//! a sample source (the mock sensor), the segmentation engine, and the
//! feature computer, with completed events rendered to the console.
//!
//! # Usage
//!
//! Run against the mock sensor until Ctrl-C:
//! ```bash
//! motion_daq monitor
//! ```
//!
//! Run for ten seconds with a custom configuration:
//! ```bash
//! motion_daq monitor --config config/motion.toml --duration-secs 10
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use motion_daq::config::MotionConfig;
use motion_daq::core::SampleSource;
use motion_daq::error::MotionError;
use motion_daq::features::EventFeatures;
use motion_daq::link::MockImuLink;
use motion_daq::monitor::{run_session, MotionMonitor};
use motion_daq::telemetry;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Parser)]
#[command(name = "motion-daq")]
#[command(about = "Headless movement-detection monitor for wireless IMU sensors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a monitoring session against the mock sensor
    Monitor {
        /// Optional configuration file (defaults to config/motion.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Stop after this many seconds (runs until Ctrl-C when omitted)
        #[arg(long)]
        duration_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Monitor {
            config,
            duration_secs,
        } => run_monitor(config, duration_secs).await,
    }
}

async fn run_monitor(config_path: Option<PathBuf>, duration_secs: Option<u64>) -> Result<()> {
    let config = match &config_path {
        Some(path) => MotionConfig::load_from(path)?,
        None => MotionConfig::load()?,
    };
    config.validate().map_err(MotionError::Configuration)?;
    telemetry::init_from_config(&config).map_err(MotionError::Configuration)?;

    println!("motion-daq - movement monitoring session");
    println!("   Device: {} (mock)", config.link.device_name);
    println!(
        "   Threshold: {:.2} g, hysteresis: {:?}, pre-roll: {} samples",
        config.detection.threshold_g, config.detection.hysteresis, config.detection.preroll_capacity
    );
    println!();

    let mut link = MockImuLink::new(&config.link);
    let mut monitor = MotionMonitor::new(&config)?;

    link.connect().await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let timeout = duration_secs.map(Duration::from_secs);
    tokio::spawn(async move {
        match timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
        let _ = shutdown_tx.send(true);
    });

    println!("Monitoring - press Ctrl-C to stop");
    println!();

    run_session(
        &mut link,
        &mut monitor,
        config.link.poll_interval,
        shutdown_rx,
        render_event,
    )
    .await?;

    link.disconnect().await?;

    let events = monitor.peak_history().len() - 1;
    println!();
    println!("Session finished: {events} movement event(s) detected");
    Ok(())
}

fn render_event(features: &EventFeatures) {
    println!(
        "Movement: peak {:.2} g (delta {:+.2}), {} samples over {:.2} s",
        features.peak,
        features.delta,
        features.table.len(),
        features.table.span_seconds()
    );
}
